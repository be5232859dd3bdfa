//! src/eventbus/mod.rs
//!
//! In-process event bus. Every subscriber gets its own bounded MPSC queue, so a
//! slow display collaborator applies backpressure instead of losing events.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch, Mutex};

use chatwarden_common::models::{ScoreAggregate, SessionHandle, TransportSource, Verdict};

/// Everything the core announces to display collaborators.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// One classified chat line. `text` is `None` when the verdict hides the original.
    Message {
        user: String,
        text: Option<String>,
        verdict: Verdict,
        /// Scripted or generated reaction, if the verdict calls for one.
        reply: Option<String>,
        observed_at: DateTime<Utc>,
    },

    Leaderboard(Vec<ScoreAggregate>),

    /// The primary transport was abandoned for the fallback.
    Failover { reason: String },

    SessionStarted {
        source: TransportSource,
        handle: SessionHandle,
    },

    SessionEnded {
        source: TransportSource,
        reason: String,
    },
}

/// If a subscriber's buffer fills, `publish` waits for space. Subscribers that
/// dropped their receiver are pruned on the next publish.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<ChatEvent>>>>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    pub shutdown_rx: watch::Receiver<bool>,
}

const DEFAULT_BUFFER_SIZE: usize = 1024;

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: Arc::new(tx),
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<ChatEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        self.subscribers.lock().await.push(tx);
        rx
    }

    /// Drops every subscriber's sender. Receivers still get what is queued and
    /// then see the channel close. Returns how many subscribers were detached.
    pub async fn close(&self) -> usize {
        let mut subs = self.subscribers.lock().await;
        let detached = subs.len();
        subs.clear();
        detached
    }

    pub async fn publish(&self, event: ChatEvent) {
        let senders = {
            let subs = self.subscribers.lock().await;
            subs.clone()
        };

        let mut any_closed = false;
        for s in senders {
            if s.send(event.clone()).await.is_err() {
                any_closed = true;
            }
        }

        if any_closed {
            self.subscribers.lock().await.retain(|s| !s.is_closed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout, Duration};

    fn failover(reason: &str) -> ChatEvent {
        ChatEvent::Failover { reason: reason.into() }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new();

        let mut rx1 = bus.subscribe(Some(5)).await;
        let mut rx2 = bus.subscribe(Some(5)).await;

        bus.publish(ChatEvent::Leaderboard(vec![])).await;

        let evt1 = rx1.recv().await.expect("rx1 should get event");
        let evt2 = rx2.recv().await.expect("rx2 should get event");
        assert!(matches!(evt1, ChatEvent::Leaderboard(ref b) if b.is_empty()));
        assert!(matches!(evt2, ChatEvent::Leaderboard(ref b) if b.is_empty()));
    }

    #[tokio::test]
    async fn test_backpressure_blocking() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Some(1)).await;

        bus.publish(failover("first")).await;

        let handle = tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            let first = rx.recv().await.expect("expected first message");
            let second = rx.recv().await.expect("expected second message");
            (first, second)
        });

        let second_publish = bus.publish(failover("second"));
        let result = timeout(Duration::from_millis(500), second_publish).await;
        assert!(result.is_ok(), "publish should eventually unblock");

        let (evt1, evt2) = handle.await.unwrap();
        match (evt1, evt2) {
            (ChatEvent::Failover { reason: a }, ChatEvent::Failover { reason: b }) => {
                assert_eq!(a, "first");
                assert_eq!(b, "second");
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let rx = bus.subscribe(Some(1)).await;
        let _kept = bus.subscribe(Some(4)).await;
        drop(rx);

        bus.publish(failover("x")).await;
        assert_eq!(bus.close().await, 1);
    }

    #[tokio::test]
    async fn test_close_lets_subscribers_drain_then_end() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(None).await;
        let publisher = bus.clone();

        publisher.publish(failover("last words")).await;
        publisher.publish(ChatEvent::Leaderboard(vec![])).await;
        bus.close().await;

        assert!(matches!(rx.recv().await, Some(ChatEvent::Failover { .. })));
        assert!(matches!(rx.recv().await, Some(ChatEvent::Leaderboard(_))));
        assert!(rx.recv().await.is_none());
        assert_eq!(publisher.close().await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_is_visible_to_clones() {
        let bus = EventBus::new();
        let clone = bus.clone();
        let mut rx = clone.shutdown_rx.clone();
        bus.shutdown();
        rx.changed().await.unwrap();
        assert!(*clone.shutdown_rx.borrow());
    }
}
