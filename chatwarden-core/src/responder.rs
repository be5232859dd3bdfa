// File: src/responder.rs

use std::sync::Arc;

use chrono::Local;
use rand::seq::IndexedRandom;
use tracing::info;

use chatwarden_common::models::{LedgerEntry, RawMessage, ScoreAggregate, Verdict};
use chatwarden_common::traits::LedgerStore;

use crate::eventbus::{ChatEvent, EventBus};
use crate::Error;

pub const CREDENTIAL_WARNING: &str =
    "⚠️ For security reasons I can't process messages that look like API keys or tokens. Never share keys in chat! 🔒";

const LOVE_EMOJIS: &[&str] = &[
    "💖", "💗", "💓", "💞", "💕", "💘", "💝", "❤️", "🧡", "💛", "💚", "💙", "💜", "🤍", "🩷", "🫶",
];
const LOVE_EMOJI_COUNT: usize = 14;

/// Applies a verdict: writes the ledger entry when the verdict carries a score,
/// then announces the outcome on the event bus.
pub struct Responder {
    ledger: Arc<dyn LedgerStore>,
    bus: EventBus,
    points_per_reward: f64,
}

impl Responder {
    pub fn new(ledger: Arc<dyn LedgerStore>, bus: EventBus, points_per_reward: f64) -> Self {
        Self {
            ledger,
            bus,
            points_per_reward,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerStore> {
        &self.ledger
    }

    /// The ledger write happens before publishing; a failed write is returned
    /// and the verdict is not announced.
    pub async fn respond(&self, msg: &RawMessage, verdict: Verdict) -> Result<(), Error> {
        if let Some(score) = verdict.score(self.points_per_reward) {
            let entry = LedgerEntry {
                timestamp: Local::now().naive_local(),
                user: msg.source_user.clone(),
                message: msg.text.clone(),
                score,
            };
            self.ledger.append(&entry).await?;
        }

        let text = verdict.shows_original().then(|| msg.text.clone());
        let reply = reaction(&verdict, &msg.source_user);
        self.bus
            .publish(ChatEvent::Message {
                user: msg.source_user.clone(),
                text,
                verdict,
                reply,
                observed_at: msg.observed_at,
            })
            .await;
        Ok(())
    }

    pub async fn publish_leaderboard(&self, board: Vec<ScoreAggregate>) {
        if board.is_empty() {
            return;
        }
        info!(
            "Leaderboard: {}",
            board
                .iter()
                .map(|a| format!("{} {}", a.user, a.total))
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.bus.publish(ChatEvent::Leaderboard(board)).await;
    }
}

/// Text a display collaborator can post back to chat for `verdict`.
pub fn reaction(verdict: &Verdict, user: &str) -> Option<String> {
    match verdict {
        Verdict::CredentialLeak => Some(CREDENTIAL_WARNING.to_string()),
        Verdict::NoveltyReward { quote, emoji_set, .. } => {
            Some(format!("{}\n{}", emoji_set.join(" "), quote))
        }
        Verdict::Moderated { .. } => Some(format!("💖 {} 💖\n{}", user, love_spam())),
        Verdict::Answer { text } => Some(text.clone()),
        Verdict::PassThrough { .. } | Verdict::Suppressed => None,
    }
}

fn love_spam() -> String {
    LOVE_EMOJIS
        .choose_multiple(&mut rand::rng(), LOVE_EMOJI_COUNT)
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
