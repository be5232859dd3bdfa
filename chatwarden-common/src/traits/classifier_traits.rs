use async_trait::async_trait;

use crate::error::ClassifierError;

/// Remote text classifier used by the pipeline for moderation and answers.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// `true` when the message is hostile towards the presenter or other chatters.
    async fn moderation_check(&self, text: &str) -> Result<bool, ClassifierError>;

    /// Generates a short reply to a question, given recent chat as context.
    async fn answer(&self, text: &str, context: &[String]) -> Result<String, ClassifierError>;
}
