// File: src/tasks/processor.rs

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use chatwarden_common::models::RawMessage;

use crate::config::ProcessorConfig;
use crate::dedup::DedupWindow;
use crate::ledger::leaderboard;
use crate::pipeline::ClassifierPipeline;
use crate::responder::Responder;
use crate::Error;

/// The processing side of the service: dedup, classification, scoring and
/// leaderboards, one message at a time.
pub struct ChatProcessor {
    config: ProcessorConfig,
    dedup: DedupWindow,
    pipeline: ClassifierPipeline,
    responder: Responder,
    since_leaderboard: usize,
    processed_total: u64,
}

impl ChatProcessor {
    pub fn new(config: ProcessorConfig, pipeline: ClassifierPipeline, responder: Responder) -> Self {
        let dedup = DedupWindow::new(config.dedup_capacity);
        Self {
            config,
            dedup,
            pipeline,
            responder,
            since_leaderboard: 0,
            processed_total: 0,
        }
    }

    pub fn dedup(&self) -> &DedupWindow {
        &self.dedup
    }

    pub fn pipeline(&self) -> &ClassifierPipeline {
        &self.pipeline
    }

    pub fn processed_total(&self) -> u64 {
        self.processed_total
    }

    /// Handles one batch in order. Returns how many messages were new.
    ///
    /// Only a corrupted dedup window is an error; everything else is logged.
    pub async fn process_batch(&mut self, batch: Vec<RawMessage>) -> Result<usize, Error> {
        let mut accepted = 0;

        for msg in batch {
            if !self.dedup.accept(&msg) {
                continue;
            }
            self.dedup.check_invariants()?;
            accepted += 1;

            let verdict = self.pipeline.classify(&msg).await;
            if let Err(e) = self.responder.respond(&msg, verdict).await {
                error!("Failed to record verdict for {}: {}", msg.source_user, e);
            }

            self.processed_total += 1;
            self.since_leaderboard += 1;
            if self.config.leaderboard_every > 0 && self.since_leaderboard >= self.config.leaderboard_every {
                self.since_leaderboard = 0;
                self.publish_leaderboard().await;
            }
        }

        Ok(accepted)
    }

    pub async fn publish_leaderboard(&self) {
        match leaderboard(self.responder.ledger().as_ref(), self.config.leaderboard_size).await {
            Ok(board) => self.responder.publish_leaderboard(board).await,
            Err(e) => warn!("Could not compute leaderboard: {}", e),
        }
    }

    /// Publishes the opening leaderboard, then drains batches until the channel
    /// closes or shutdown is signalled.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<Vec<RawMessage>>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), Error> {
        self.publish_leaderboard().await;

        loop {
            let batch = tokio::select! {
                batch = rx.recv() => batch,
                _ = shutdown.changed() => None,
            };
            match batch {
                Some(batch) => {
                    self.process_batch(batch).await?;
                }
                None => break,
            }
        }

        info!("Processor stopped after {} message(s)", self.processed_total);
        Ok(())
    }
}
