//! Bounded retries: on a failed initial connect and after an unexpected
//! transport closure.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]


use std::time::Duration;

use chatwire_client::channel::{Backoff, ConnectionState, ReconnectPolicy};
use chatwire_core::protocol::WirePayload;
use scripted::{eventually, options, wait_state, Harness, RecordingSleeper};

#[tokio::test]
async fn reconnects_after_remote_close() {
    let mut h = Harness::new();
    h.channel.connect().await.unwrap();

    h.script.drop_connection();
    eventually("second open", || h.script.opens() == 2).await;
    wait_state(&h.channel, ConnectionState::Connected).await;

    assert_eq!(h.sleeper.delays(), vec![Duration::from_secs(1)]);

    h.channel.send(&WirePayload::new("after")).unwrap();
    assert_eq!(h.next_write().await["message"], "after");
}

#[tokio::test]
async fn gives_up_after_five_failed_attempts() {
    let mut h = Harness::new();
    h.channel.connect().await.unwrap();

    h.script.fail_always(true);
    h.script.drop_connection();

    eventually("five retries", || {
        h.script.opens() == 6 && h.sleeper.calls() == 5
    })
    .await;
    wait_state(&h.channel, ConnectionState::Disconnected).await;

    // no sixth automatic attempt
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.script.opens(), 6);
    assert_eq!(h.sleeper.calls(), 5);
    assert_eq!(h.channel.state(), ConnectionState::Disconnected);

    let err = h.channel.send(&WirePayload::new("x")).unwrap_err();
    assert_eq!(err.code().as_str(), "NOT_CONNECTED");
    h.assert_no_write();

    // manual connect works again
    h.script.fail_always(false);
    h.channel.connect().await.unwrap();
    assert!(h.channel.is_connected());
    assert_eq!(h.script.opens(), 7);
}

#[tokio::test]
async fn initial_connect_gives_up_after_five_attempts() {
    let h = Harness::new();
    h.script.fail_always(true);

    let err = h.channel.connect().await.unwrap_err();
    assert_eq!(err.code().as_str(), "CONNECTION_ERROR");
    assert_eq!(h.script.opens(), 5);
    assert_eq!(h.sleeper.delays(), vec![Duration::from_secs(1); 4]);

    // no sixth attempt
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.script.opens(), 5);
    assert_eq!(h.channel.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn initial_connect_succeeds_on_a_retry() {
    let h = Harness::new();
    h.script.fail_next(2);

    h.channel.connect().await.unwrap();
    assert!(h.channel.is_connected());
    assert_eq!(h.script.opens(), 3);
    assert_eq!(h.sleeper.calls(), 2);
}

#[tokio::test]
async fn disconnect_cancels_initial_retries() {
    let h = Harness::with(options(), RecordingSleeper::parked());
    h.script.fail_always(true);

    let channel = h.channel.clone();
    let pending = tokio::spawn(async move { channel.connect().await });
    eventually("retry scheduled", || h.sleeper.calls() == 1).await;

    h.channel.disconnect();
    let res = tokio::time::timeout(scripted::WAIT, pending).await.unwrap().unwrap();
    assert_eq!(res.unwrap_err().code().as_str(), "CONNECTION_ERROR");
    assert_eq!(h.script.opens(), 1);
    assert_eq!(h.channel.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn attempt_counter_resets_after_success() {
    let h = Harness::new();
    h.channel.connect().await.unwrap();

    // four failures then success, twice in a row: only works if the
    // counter starts over after each successful reconnect
    for round in 1..=2 {
        h.script.fail_next(4);
        h.script.drop_connection();
        let want = 1 + round * 5;
        eventually("reconnected", || h.script.opens() == want).await;
        wait_state(&h.channel, ConnectionState::Connected).await;
    }
    assert_eq!(h.sleeper.calls(), 10);
}

#[tokio::test]
async fn exponential_backoff_delays() {
    let mut opts = options();
    opts.reconnect = ReconnectPolicy {
        max_attempts: 5,
        delay: Duration::from_millis(100),
        backoff: Backoff::Exponential {
            max_delay: Duration::from_millis(500),
        },
    };
    let h = Harness::with(opts, RecordingSleeper::default());
    h.channel.connect().await.unwrap();

    h.script.fail_always(true);
    h.script.drop_connection();
    eventually("loop exhausted", || h.sleeper.calls() == 5 && h.script.opens() == 6).await;

    let ms: Vec<u128> = h.sleeper.delays().iter().map(Duration::as_millis).collect();
    assert_eq!(ms, vec![100, 200, 400, 500, 500]);
}

#[tokio::test]
async fn disconnect_cancels_pending_reconnect() {
    let h = Harness::with(options(), RecordingSleeper::parked());
    h.channel.connect().await.unwrap();

    h.script.drop_connection();
    eventually("reconnect scheduled", || h.sleeper.calls() == 1).await;
    assert_eq!(h.channel.state(), ConnectionState::Disconnected);

    h.channel.disconnect();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(h.script.opens(), 1);
    assert_eq!(h.channel.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn manual_connect_replaces_pending_reconnect() {
    let h = Harness::with(options(), RecordingSleeper::parked());
    h.channel.connect().await.unwrap();

    h.script.drop_connection();
    eventually("reconnect scheduled", || h.sleeper.calls() == 1).await;

    h.channel.connect().await.unwrap();
    assert!(h.channel.is_connected());
    assert_eq!(h.script.opens(), 2);

    // the abandoned loop never wakes up to open again
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(h.script.opens(), 2);
    assert!(h.channel.is_connected());
}

#[tokio::test]
async fn explicit_disconnect_does_not_reconnect() {
    let h = Harness::new();
    h.channel.connect().await.unwrap();
    h.channel.disconnect();

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(h.script.opens(), 1);
    assert_eq!(h.sleeper.calls(), 0);
}
