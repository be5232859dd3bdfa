// File: chatwarden-common/src/models/message.rs

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One chat line as delivered by a transport, before any classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub source_user: String,
    pub text: String,
    pub observed_at: DateTime<Utc>,
}

impl RawMessage {
    pub fn new(source_user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_user: source_user.into(),
            text: text.into(),
            observed_at: Utc::now(),
        }
    }

    pub fn observed(source_user: impl Into<String>, text: impl Into<String>, observed_at: DateTime<Utc>) -> Self {
        Self {
            source_user: source_user.into(),
            text: text.into(),
            observed_at,
        }
    }

    /// `user:text`, kept readable on purpose so duplicates can be eyeballed in logs.
    pub fn fingerprint(&self) -> String {
        format!("{}:{}", self.source_user, self.text)
    }
}

/// Opaque identifier of an active chat session (e.g. a live chat id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandle(pub String);

impl SessionHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportSource {
    Primary,
    Fallback,
}

impl fmt::Display for TransportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportSource::Primary => write!(f, "primary"),
            TransportSource::Fallback => write!(f, "fallback"),
        }
    }
}
