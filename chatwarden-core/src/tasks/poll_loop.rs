// File: src/tasks/poll_loop.rs
//
// Background fetch task. Owns the transport and the discovery/polling state
// machine and hands batches to the processing loop over a channel.
//
//   Discovering --found--> Polling --SessionEnded--> Discovering
//        |                    |
//        +--QuotaExceeded-----+--> Degraded --fail over--> Discovering (fallback)

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use chatwarden_common::error::TransportError;
use chatwarden_common::models::{RawMessage, SessionHandle, TransportSource};
use chatwarden_common::traits::ChatTransport;

use crate::config::PollConfig;
use crate::eventbus::{ChatEvent, EventBus};
use crate::platforms::FailoverTransport;

#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    Discovering,
    Polling(SessionHandle),
    /// The primary ran out of quota; the next tick switches to the fallback.
    Degraded { reason: String },
}

/// What a single tick did, and therefore how long to wait before the next one.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing is live yet.
    Idle,
    Discovered(SessionHandle),
    Batch(Vec<RawMessage>),
    SessionEnded,
    Degraded,
    FailedOver,
    /// A transient error was logged; try again at the normal interval.
    Retry(TransportError),
}

pub struct PollLoop {
    transport: FailoverTransport,
    state: PollState,
    config: PollConfig,
    bus: EventBus,
}

impl PollLoop {
    pub fn new(transport: FailoverTransport, config: PollConfig, bus: EventBus) -> Self {
        Self {
            transport,
            state: PollState::Discovering,
            config,
            bus,
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn source(&self) -> TransportSource {
        self.transport.source()
    }

    pub fn transport(&self) -> &FailoverTransport {
        &self.transport
    }

    pub async fn tick(&mut self) -> TickOutcome {
        match self.state.clone() {
            PollState::Discovering => self.discover().await,
            PollState::Polling(handle) => self.poll(&handle).await,
            PollState::Degraded { reason } => {
                if self.transport.fail_over().await {
                    warn!("Primary chat feed out of quota ({}); using fallback", reason);
                    self.bus.publish(ChatEvent::Failover { reason }).await;
                }
                self.state = PollState::Discovering;
                TickOutcome::FailedOver
            }
        }
    }

    async fn discover(&mut self) -> TickOutcome {
        let source = self.transport.source();
        match self.transport.discover().await {
            Ok(Some(handle)) => {
                info!("Chat session {} found via {}", handle, source);
                self.bus
                    .publish(ChatEvent::SessionStarted {
                        source,
                        handle: handle.clone(),
                    })
                    .await;
                self.state = PollState::Polling(handle.clone());
                TickOutcome::Discovered(handle)
            }
            Ok(None) => TickOutcome::Idle,
            Err(e) => self.on_error(e, source),
        }
    }

    async fn poll(&mut self, handle: &SessionHandle) -> TickOutcome {
        let source = self.transport.source();
        match self.transport.fetch_new_messages().await {
            Ok(batch) => {
                if !batch.is_empty() {
                    debug!("{} new message(s) from {}", batch.len(), source);
                }
                TickOutcome::Batch(batch)
            }
            Err(e) if e.is_session_ended() => {
                info!("Chat session {} ended: {}", handle, e);
                self.state = PollState::Discovering;
                self.bus
                    .publish(ChatEvent::SessionEnded {
                        source,
                        reason: e.to_string(),
                    })
                    .await;
                TickOutcome::SessionEnded
            }
            Err(e) => self.on_error(e, source),
        }
    }

    fn on_error(&mut self, e: TransportError, source: TransportSource) -> TickOutcome {
        if e.is_quota_exceeded() && source == TransportSource::Primary && self.transport.has_fallback() {
            self.state = PollState::Degraded {
                reason: e.to_string(),
            };
            return TickOutcome::Degraded;
        }
        warn!("Chat transport error ({}): {}", source, e);
        TickOutcome::Retry(e)
    }

    /// Sleep before the next tick. State transitions continue immediately.
    pub fn delay_after(&self, outcome: &TickOutcome) -> Duration {
        match outcome {
            TickOutcome::Idle => self.config.idle_interval,
            // nothing to fail over to; wait out the quota at the idle pace
            TickOutcome::Retry(e) if e.is_quota_exceeded() => self.config.idle_interval,
            TickOutcome::Batch(_) | TickOutcome::Retry(_) => match self.transport.source() {
                TransportSource::Primary => self.config.primary_interval,
                TransportSource::Fallback => self.config.fallback_interval,
            },
            TickOutcome::Discovered(_)
            | TickOutcome::SessionEnded
            | TickOutcome::Degraded
            | TickOutcome::FailedOver => Duration::ZERO,
        }
    }

    /// Ticks until shutdown or until the receiving side goes away, then closes the transport.
    pub async fn run(mut self, tx: mpsc::Sender<Vec<RawMessage>>, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            let outcome = tokio::select! {
                outcome = self.tick() => outcome,
                _ = shutdown.changed() => break,
            };
            let delay = self.delay_after(&outcome);

            if let TickOutcome::Batch(batch) = outcome {
                if !batch.is_empty() && tx.send(batch).await.is_err() {
                    debug!("Processor gone, stopping poll loop");
                    break;
                }
            }

            if !delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown.changed() => break,
                }
            }
        }

        if let Err(e) = self.transport.close().await {
            error!("Error closing chat transport: {}", e);
        }
        info!("Poll loop stopped");
    }
}

/// Spawns [`PollLoop::run`] on the runtime.
pub fn spawn_poll_loop(
    poll_loop: PollLoop,
    tx: mpsc::Sender<Vec<RawMessage>>,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(poll_loop.run(tx, shutdown))
}
