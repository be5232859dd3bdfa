use serde::{Serialize, Deserialize};
use std::collections::HashMap;

/// Configuration for an AI provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The type of provider (groq, openai, ...)
    pub provider_type: String,

    /// Base URL for API requests
    pub api_base: Option<String>,

    /// API key for authentication
    pub api_key: String,

    /// Default model to use with this provider
    pub default_model: String,

    /// Additional provider-specific configuration options
    pub options: HashMap<String, String>,
}

impl ProviderConfig {
    /// Groq's OpenAI-compatible endpoint with a fast general model.
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: "groq".to_string(),
            api_base: Some("https://api.groq.com/openai/v1".to_string()),
            api_key: api_key.into(),
            default_model: "llama-3.3-70b-versatile".to_string(),
            options: HashMap::new(),
        }
    }
}

/// A single chat-completion turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Sampling knobs for one completion request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}
