// tests/poll_loop_tests.rs
mod test_utils;

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

use chatwarden_common::error::TransportError;
use chatwarden_common::models::{SessionHandle, TransportSource};
use chatwarden_common::traits::ChatTransport;
use chatwarden_core::config::PollConfig;
use chatwarden_core::eventbus::{ChatEvent, EventBus};
use chatwarden_core::platforms::{FailoverTransport, WidgetConfig, WidgetTransport};
use chatwarden_core::tasks::{spawn_poll_loop, PollLoop, PollState, TickOutcome};

use test_utils::{handle, msg, FakeDom, ScriptedTransport};

fn fast_config() -> PollConfig {
    PollConfig {
        primary_interval: Duration::from_millis(1),
        fallback_interval: Duration::from_millis(1),
        idle_interval: Duration::from_millis(5),
    }
}

fn quota() -> TransportError {
    TransportError::QuotaExceeded("quotaExceeded".into())
}

#[tokio::test]
async fn quota_exhaustion_fails_over_exactly_once() {
    let primary = ScriptedTransport::new(TransportSource::Primary)
        .discovers(Ok(handle("yt-chat")))
        .fetches(Ok(vec![msg("alice", "hello from youtube")]))
        .fetches(Err(quota()));
    let primary_calls = primary.calls.clone();

    let fallback = ScriptedTransport::new(TransportSource::Fallback)
        .discovers(Ok(handle("widget#chat-line")))
        .fetches(Ok(vec![msg("bob", "hello from the widget")]));
    let fallback_calls = fallback.calls.clone();

    let bus = EventBus::new();
    let mut events = bus.subscribe(None).await;
    let transport = FailoverTransport::new(Box::new(primary), Box::new(fallback));
    let mut poll = PollLoop::new(transport, fast_config(), bus.clone());

    assert_eq!(poll.tick().await, TickOutcome::Discovered(SessionHandle("yt-chat".into())));
    assert!(matches!(poll.tick().await, TickOutcome::Batch(b) if b.len() == 1));
    assert_eq!(poll.tick().await, TickOutcome::Degraded);
    assert!(matches!(poll.state(), PollState::Degraded { .. }));

    assert_eq!(poll.tick().await, TickOutcome::FailedOver);
    assert_eq!(poll.source(), TransportSource::Fallback);
    assert!(poll.transport().is_degraded());
    assert_eq!(primary_calls.closes(), 1);

    assert_eq!(
        poll.tick().await,
        TickOutcome::Discovered(SessionHandle("widget#chat-line".into()))
    );
    match poll.tick().await {
        TickOutcome::Batch(batch) => assert_eq!(batch[0].source_user, "bob"),
        other => panic!("expected a batch, got {other:?}"),
    }

    for _ in 0..5 {
        poll.tick().await;
    }
    assert_eq!(primary_calls.fetches(), 2);
    assert_eq!(primary_calls.discovers(), 1);
    assert!(fallback_calls.fetches() >= 6);

    let mut failovers = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, ChatEvent::Failover { .. }) {
            failovers += 1;
        }
    }
    assert_eq!(failovers, 1);
}

#[tokio::test]
async fn fail_over_is_idempotent() {
    let primary = ScriptedTransport::new(TransportSource::Primary);
    let calls = primary.calls.clone();
    let mut transport = FailoverTransport::new(
        Box::new(primary),
        Box::new(ScriptedTransport::new(TransportSource::Fallback)),
    );

    assert!(transport.fail_over().await);
    assert!(!transport.fail_over().await);
    assert_eq!(calls.closes(), 1);
    assert_eq!(transport.source(), TransportSource::Fallback);
}

#[tokio::test]
async fn session_end_returns_to_discovery() {
    let primary = ScriptedTransport::new(TransportSource::Primary)
        .discovers(Ok(handle("chat-1")))
        .fetches(Err(TransportError::SessionEnded("liveChatEnded".into())))
        .discovers(Ok(None));
    let transport = FailoverTransport::new(
        Box::new(primary),
        Box::new(ScriptedTransport::new(TransportSource::Fallback)),
    );
    let mut poll = PollLoop::new(transport, fast_config(), EventBus::new());

    poll.tick().await;
    assert_eq!(poll.tick().await, TickOutcome::SessionEnded);
    assert_eq!(poll.state(), &PollState::Discovering);
    assert_eq!(poll.source(), TransportSource::Primary);

    let outcome = poll.tick().await;
    assert_eq!(outcome, TickOutcome::Idle);
    assert_eq!(poll.delay_after(&outcome), fast_config().idle_interval);
}

#[tokio::test]
async fn transient_errors_retry_at_poll_interval_without_failover() {
    let primary = ScriptedTransport::new(TransportSource::Primary)
        .discovers(Ok(handle("chat-1")))
        .fetches(Err(TransportError::Network("connection reset".into())));
    let transport = FailoverTransport::new(
        Box::new(primary),
        Box::new(ScriptedTransport::new(TransportSource::Fallback)),
    );
    let mut poll = PollLoop::new(transport, fast_config(), EventBus::new());

    poll.tick().await;
    let outcome = poll.tick().await;
    assert!(matches!(outcome, TickOutcome::Retry(TransportError::Network(_))));
    assert_eq!(poll.delay_after(&outcome), fast_config().primary_interval);
    assert!(matches!(poll.state(), PollState::Polling(_)));
    assert_eq!(poll.source(), TransportSource::Primary);
}

#[tokio::test]
async fn starting_on_fallback_never_touches_a_primary() {
    let fallback = ScriptedTransport::new(TransportSource::Fallback).discovers(Ok(handle("w")));
    let transport = FailoverTransport::fallback_only(Box::new(fallback));
    let mut poll = PollLoop::new(transport, fast_config(), EventBus::new());

    assert_eq!(poll.source(), TransportSource::Fallback);
    assert!(matches!(poll.tick().await, TickOutcome::Discovered(_)));
}

#[tokio::test]
async fn quota_without_fallback_waits_at_idle_pace() {
    let primary = ScriptedTransport::new(TransportSource::Primary)
        .discovers(Ok(handle("yt-chat")))
        .fetches(Err(quota()));
    let calls = primary.calls.clone();
    let transport = FailoverTransport::primary_only(Box::new(primary));
    let mut poll = PollLoop::new(transport, fast_config(), EventBus::new());

    assert!(matches!(poll.tick().await, TickOutcome::Discovered(_)));
    let outcome = poll.tick().await;
    assert_eq!(outcome, TickOutcome::Retry(quota()));
    assert_eq!(poll.delay_after(&outcome), fast_config().idle_interval);
    assert!(matches!(poll.state(), PollState::Polling(_)));

    assert!(!poll.transport().is_degraded());
    assert_eq!(poll.source(), TransportSource::Primary);
    assert_eq!(calls.closes(), 0);
}

#[tokio::test]
async fn background_loop_delivers_batches_and_stops_on_shutdown() {
    let primary = ScriptedTransport::new(TransportSource::Primary)
        .discovers(Ok(handle("chat-1")))
        .fetches(Ok(vec![msg("alice", "first batch line")]));
    let calls = primary.calls.clone();
    let transport = FailoverTransport::new(
        Box::new(primary),
        Box::new(ScriptedTransport::new(TransportSource::Fallback)),
    );
    let poll = PollLoop::new(transport, fast_config(), EventBus::new());

    let (tx, mut rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = spawn_poll_loop(poll, tx, shutdown_rx);

    let batch = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("batch in time")
        .expect("channel open");
    assert_eq!(batch[0].text, "first batch line");

    shutdown_tx.send(true).unwrap();
    timeout(Duration::from_secs(2), task)
        .await
        .expect("loop stops")
        .unwrap();
    assert_eq!(calls.closes(), 1);
}

#[tokio::test]
async fn crashed_browser_sends_fallback_back_to_discovery() {
    let dom = FakeDom::new(".chat-line");
    dom.render("alice", "hello from the widget");
    let widget = WidgetTransport::new(WidgetConfig::new("http://w"), Box::new(dom.clone()));
    let transport = FailoverTransport::fallback_only(Box::new(widget));
    let bus = EventBus::new();
    let mut events = bus.subscribe(None).await;
    let mut poll = PollLoop::new(transport, fast_config(), bus.clone());

    assert!(matches!(poll.tick().await, TickOutcome::Discovered(_)));
    assert!(matches!(poll.tick().await, TickOutcome::Batch(b) if b.len() == 1));

    dom.lose_session();
    assert_eq!(poll.tick().await, TickOutcome::SessionEnded);
    assert_eq!(poll.state(), &PollState::Discovering);

    assert!(matches!(poll.tick().await, TickOutcome::Discovered(_)));
    assert!(matches!(poll.state(), PollState::Polling(_)));
    assert_eq!(dom.opened.lock().unwrap().len(), 2);

    let mut ended = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, ChatEvent::SessionEnded { source: TransportSource::Fallback, .. }) {
            ended += 1;
        }
    }
    assert_eq!(ended, 1);
}
