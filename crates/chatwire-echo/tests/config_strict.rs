#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chatwire_echo::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
server:
  listen: "127.0.0.1:8000"
  reply_prefx: "> " # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.server.listen, "127.0.0.1:8000");
    assert_eq!(cfg.server.reply_prefix, "Echo: ");
}

#[test]
fn idle_timeout_must_exceed_ping() {
    let bad = r#"
version: 1
server:
  ping_interval_ms: 20000
  idle_timeout_ms: 20000
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn wrong_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}
