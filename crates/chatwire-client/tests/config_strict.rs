#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use chatwire_client::channel::{Backoff, ChannelOptions};
use chatwire_client::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
channel:
  endpoint: "ws://localhost:8000/ws"
  reconnect:
    max_attempt: 3 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config_uses_defaults() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.channel.endpoint, "ws://localhost:8000/ws");

    let opts = ChannelOptions::from(&cfg.channel);
    assert_eq!(opts.connect_timeout, Duration::from_secs(5));
    assert_eq!(opts.reconnect.max_attempts, 5);
    assert_eq!(opts.reconnect.delay, Duration::from_secs(1));
    assert_eq!(opts.reconnect.backoff, Backoff::Fixed);
}

#[test]
fn exponential_section() {
    let ok = r#"
version: 1
channel:
  endpoint: "wss://chat.example.com/ws"
  connect_timeout_ms: 2000
  reconnect:
    max_attempts: 3
    delay_ms: 250
    backoff: exponential
    max_delay_ms: 4000
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    let policy = ChannelOptions::from(&cfg.channel).reconnect;
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(
        policy.backoff,
        Backoff::Exponential {
            max_delay: Duration::from_millis(4000)
        }
    );
    assert_eq!(policy.delay_for(3), Duration::from_millis(1000));
}

#[test]
fn rejects_http_endpoint() {
    let bad = r#"
version: 1
channel:
  endpoint: "http://localhost:8000/ws"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn rejects_max_delay_below_delay() {
    let bad = r#"
version: 1
channel:
  reconnect:
    delay_ms: 5000
    max_delay_ms: 1000
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn rejects_zero_attempts() {
    let bad = r#"
version: 1
channel:
  reconnect:
    max_attempts: 0
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn wrong_version() {
    let err = config::load_from_str("version: 3\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let cfg = config::load_or_default("does/not/exist/chatwire.yaml").expect("defaults");
    assert_eq!(cfg.version, 1);
    assert!(config::load_from_file("does/not/exist/chatwire.yaml").is_err());
}
