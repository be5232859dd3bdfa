// File: src/pipeline.rs
//
// Ordered decision chain that turns one chat line into exactly one Verdict.
// Stages short-circuit in a fixed order:
//
//   1. credential guard   -> CredentialLeak
//   2. ignored author     -> Suppressed
//   3. novelty trigger    -> NoveltyReward
//   4. moderation         -> Moderated
//   5. question routing   -> Answer
//   6. meaningfulness     -> PassThrough { Meaningful | Filler }
//
// Stages 1-3 are local and never touch the classifier. Collaborator failures
// other than an unreadable reply end the chain with an unscored pass-through.

use std::sync::Arc;

use tracing::{debug, warn};

use chatwarden_ai::RetryPolicy;
use chatwarden_common::error::ClassifierError;
use chatwarden_common::models::{ModerationReason, PassKind, RawMessage, Verdict};
use chatwarden_common::traits::Classifier;

use crate::config::PipelineConfig;
use crate::counters::DailyCounterStore;
use crate::meaningful::is_meaningful;
use crate::memory::ChatMemory;
use crate::novelty::{lucky_emojis, QuoteBook};

const LUCKY_EMOJI_COUNT: usize = 3;

/// Result of a collaborator-backed stage.
enum Stage {
    Decided(Verdict),
    Next,
}

pub struct ClassifierPipeline {
    config: PipelineConfig,
    classifier: Arc<dyn Classifier>,
    retry: RetryPolicy,
    counters: DailyCounterStore,
    quotes: QuoteBook,
    memory: ChatMemory,
}

impl ClassifierPipeline {
    pub fn new(
        config: PipelineConfig,
        classifier: Arc<dyn Classifier>,
        retry: RetryPolicy,
        quotes: QuoteBook,
    ) -> Self {
        let counters = DailyCounterStore::new(config.daily_reward_cap());
        let memory = ChatMemory::new(config.chat_memory_size);
        Self {
            config,
            classifier,
            retry,
            counters,
            quotes,
            memory,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn counters(&self) -> &DailyCounterStore {
        &self.counters
    }

    pub fn memory(&self) -> &ChatMemory {
        &self.memory
    }

    /// Classifies one message. Never fails: collaborator trouble degrades to a
    /// pass-through verdict so the line can still be shown.
    pub async fn classify(&mut self, msg: &RawMessage) -> Verdict {
        let verdict = self.run_stages(msg).await;
        debug!("{} => {}", msg.fingerprint(), verdict.label());

        if matches!(verdict, Verdict::Answer { .. } | Verdict::PassThrough { .. }) {
            self.memory.store(&msg.source_user, &msg.text);
        }
        verdict
    }

    async fn run_stages(&mut self, msg: &RawMessage) -> Verdict {
        let text = msg.text.as_str();

        if self.mentions_credentials(text) {
            return Verdict::CredentialLeak;
        }

        if self.config.ignored_users.iter().any(|u| u == &msg.source_user) {
            return Verdict::Suppressed;
        }

        if text.trim() == self.config.trigger {
            return self.novelty_reward(&msg.source_user);
        }

        if let Stage::Decided(verdict) = self.moderation_stage(text).await {
            return verdict;
        }

        if text.contains('?') && text.trim().chars().count() >= self.config.min_chars_for_response {
            if let Stage::Decided(verdict) = self.question_stage(text).await {
                return verdict;
            }
        }

        let kind = if is_meaningful(text, &self.memory.texts(), self.config.similarity_threshold) {
            PassKind::Meaningful
        } else {
            PassKind::Filler
        };
        Verdict::PassThrough { kind }
    }

    fn mentions_credentials(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.config
            .sensitive_tokens
            .iter()
            .any(|token| lowered.contains(&token.to_lowercase()))
    }

    fn novelty_reward(&mut self, user: &str) -> Verdict {
        let (count, credited) = self.counters.increment(user);
        if !credited {
            debug!("{} is past the daily reward cap ({} today)", user, count);
        }
        Verdict::NoveltyReward {
            quote: self.quotes.pick(),
            emoji_set: lucky_emojis(LUCKY_EMOJI_COUNT),
            credited,
        }
    }

    async fn moderation_stage(&self, text: &str) -> Stage {
        let classifier = &self.classifier;
        match self
            .retry
            .run("moderation check", || classifier.moderation_check(text))
            .await
        {
            Ok(true) => Stage::Decided(Verdict::Moderated {
                reason: ModerationReason::Negative,
            }),
            Ok(false) => Stage::Next,
            Err(e @ ClassifierError::Malformed(_)) => {
                warn!("Unreadable moderation reply, treating as not negative: {}", e);
                Stage::Next
            }
            Err(e) => {
                warn!("Moderation unavailable, passing message through unscored: {}", e);
                Stage::Decided(unclassified())
            }
        }
    }

    async fn question_stage(&self, text: &str) -> Stage {
        let classifier = &self.classifier;
        let context = self.memory.context();
        match self
            .retry
            .run("answer", || classifier.answer(text, &context))
            .await
        {
            Ok(answer) if !answer.trim().is_empty() => Stage::Decided(Verdict::Answer {
                text: answer.trim().to_string(),
            }),
            Ok(_) => Stage::Next,
            Err(e @ ClassifierError::Malformed(_)) => {
                warn!("No confident answer: {}", e);
                Stage::Next
            }
            Err(e) => {
                warn!("Answer unavailable, passing message through unscored: {}", e);
                Stage::Decided(unclassified())
            }
        }
    }
}

fn unclassified() -> Verdict {
    Verdict::PassThrough {
        kind: PassKind::Unclassified,
    }
}
