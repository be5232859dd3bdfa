pub mod classifier;
pub mod models;
pub mod prompts;
pub mod provider;
pub mod retry;

// Re-export public APIs
pub use classifier::LlmClassifier;
pub use models::{ChatMessage, CompletionOptions, ProviderConfig};
pub use provider::{ModelProvider, OpenAIProvider};
pub use retry::RetryPolicy;
