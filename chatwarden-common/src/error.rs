// ================================================================
// File: chatwarden-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("Ledger error: {0}")]
    Ledger(String),

    /// In-memory store corruption. Not recoverable; the process should restart.
    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Event bus error: {0}")]
    EventBus(String),

    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),
}

/// Failures raised by a chat transport (structured feed or widget scraper).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    /// The feed refused the call because the daily quota is spent.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The live session the handle pointed at is gone.
    #[error("session ended: {0}")]
    SessionEnded(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("browser driver error: {0}")]
    Driver(String),

    #[error("unparseable response: {0}")]
    Parse(String),

    #[error("transport not connected")]
    NotConnected,
}

impl TransportError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, TransportError::QuotaExceeded(_))
    }

    pub fn is_session_ended(&self) -> bool {
        matches!(self, TransportError::SessionEnded(_))
    }
}

/// Failures raised by the classifier collaborator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifierError {
    /// Service-unavailable class of failure; worth retrying.
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    /// The collaborator answered but the body could not be interpreted.
    #[error("malformed classifier response: {0}")]
    Malformed(String),

    #[error("classifier upstream returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("classifier gave up after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl ClassifierError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ClassifierError::Unavailable(_))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<chrono::format::ParseError> for Error {
    fn from(err: chrono::format::ParseError) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::Parse(err.to_string())
    }
}
