use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error};

use chatwarden_common::error::ClassifierError;
use chatwarden_common::http::{HttpClient, HttpResponse};

use crate::models::{ChatMessage, CompletionOptions, ProviderConfig};

/// A chat-completion backend.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<String, ClassifierError>;
}

/// OpenAI-compatible `/chat/completions` provider (OpenAI, Groq, DeepSeek, local servers).
pub struct OpenAIProvider {
    config: ProviderConfig,
    http: Arc<dyn HttpClient>,
}

impl OpenAIProvider {
    pub fn new(config: ProviderConfig, http: Arc<dyn HttpClient>) -> Self {
        Self { config, http }
    }

    fn api_base(&self) -> String {
        self.config
            .api_base
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
            .trim_end_matches('/')
            .to_string()
    }
}

#[async_trait]
impl ModelProvider for OpenAIProvider {
    fn name(&self) -> &str {
        &self.config.provider_type
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<String, ClassifierError> {
        let formatted_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role,
                    "content": msg.content
                })
            })
            .collect();

        let request_payload = json!({
            "model": self.config.default_model,
            "messages": formatted_messages,
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        });

        let mut headers = HashMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.config.api_key),
        );

        let url = format!("{}/chat/completions", self.api_base());
        debug!("({}) POST {}", self.name(), url);

        let response = self
            .http
            .post_json(&url, headers, &request_payload)
            .await
            .map_err(|e| ClassifierError::Unavailable(format!("request failed: {e}")))?;

        parse_completion(response)
    }
}

/// Maps a raw completion response onto content or a typed failure.
pub fn parse_completion(response: HttpResponse) -> Result<String, ClassifierError> {
    match response.status {
        200..=299 => {}
        429 | 500 | 502 | 503 | 504 => {
            return Err(ClassifierError::Unavailable(format!(
                "HTTP {}: {}",
                response.status, response.body
            )));
        }
        status => {
            error!("Completion API returned HTTP {}: {}", status, response.body);
            return Err(ClassifierError::Upstream {
                status,
                body: response.body,
            });
        }
    }

    let data: serde_json::Value = serde_json::from_str(&response.body)
        .map_err(|e| ClassifierError::Malformed(format!("non-JSON response: {e}")))?;

    if let Some(error) = data.get("error") {
        let error_message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error");
        return Err(ClassifierError::Malformed(format!("API error: {error_message}")));
    }

    data.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(|content| content.to_string())
        .ok_or_else(|| ClassifierError::Malformed("response missing choices[0].message.content".into()))
}
