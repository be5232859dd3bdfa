use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use chatwarden_common::error::ClassifierError;
use chatwarden_common::traits::Classifier;

use crate::models::{ChatMessage, CompletionOptions};
use crate::prompts::ClassifierPrompts;
use crate::provider::ModelProvider;

const MODERATION_OPTIONS: CompletionOptions = CompletionOptions { temperature: 0.3, max_tokens: 5 };
const ANSWER_OPTIONS: CompletionOptions = CompletionOptions { temperature: 0.7, max_tokens: 50 };

/// Classifier backed by a chat-completion model.
pub struct LlmClassifier {
    provider: Arc<dyn ModelProvider>,
    prompts: ClassifierPrompts,
    /// Cutoff for models that answer with a 0.0-1.0 negativity score instead of true/false.
    moderation_threshold: f64,
}

impl LlmClassifier {
    pub fn new(provider: Arc<dyn ModelProvider>, moderation_threshold: f64) -> Self {
        Self {
            provider,
            prompts: ClassifierPrompts::default(),
            moderation_threshold,
        }
    }

    pub fn with_prompts(mut self, prompts: ClassifierPrompts) -> Self {
        self.prompts = prompts;
        self
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn moderation_check(&self, text: &str) -> Result<bool, ClassifierError> {
        let messages = vec![
            ChatMessage::system(self.prompts.moderation_for(text)),
            ChatMessage::user(text),
        ];
        let reply = self.provider.chat(messages, MODERATION_OPTIONS).await?;
        debug!("moderation reply from {} => {:?}", self.provider.name(), reply);
        parse_moderation_reply(&reply, self.moderation_threshold)
    }

    async fn answer(&self, text: &str, context: &[String]) -> Result<String, ClassifierError> {
        let messages = vec![
            ChatMessage::system(self.prompts.answer_for(text, context)),
            ChatMessage::user(text),
        ];
        let reply = self.provider.chat(messages, ANSWER_OPTIONS).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(ClassifierError::Malformed("empty answer".into()));
        }
        Ok(reply.to_string())
    }
}

/// Collapses a moderation reply to a boolean. Accepts a bare true/false (or yes/no)
/// and also a numeric score, which is compared with `threshold`.
pub fn parse_moderation_reply(reply: &str, threshold: f64) -> Result<bool, ClassifierError> {
    let normalized = reply
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '.')
        .to_lowercase();

    if normalized.starts_with("true") || normalized == "yes" {
        return Ok(true);
    }
    if normalized.starts_with("false") || normalized == "no" {
        return Ok(false);
    }
    if let Ok(score) = normalized.parse::<f64>() {
        return Ok(score >= threshold);
    }
    Err(ClassifierError::Malformed(format!("unrecognised moderation reply: {reply:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_replies() {
        assert_eq!(parse_moderation_reply("true", 0.3), Ok(true));
        assert_eq!(parse_moderation_reply(" False.\n", 0.3), Ok(false));
        assert_eq!(parse_moderation_reply("'TRUE'", 0.3), Ok(true));
    }

    #[test]
    fn graded_replies_use_threshold() {
        assert_eq!(parse_moderation_reply("0.31", 0.3), Ok(true));
        assert_eq!(parse_moderation_reply("0.1", 0.3), Ok(false));
    }

    #[test]
    fn anything_else_is_malformed() {
        assert!(matches!(
            parse_moderation_reply("I think this might be rude", 0.3),
            Err(ClassifierError::Malformed(_))
        ));
    }
}
