// File: src/platforms/failover.rs

use async_trait::async_trait;
use tracing::{info, warn};

use chatwarden_common::error::TransportError;
use chatwarden_common::models::{RawMessage, SessionHandle, TransportSource};
use chatwarden_common::traits::ChatTransport;

/// Primary transport with a one-way switch to a fallback.
///
/// Once [`fail_over`](Self::fail_over) has run the primary is closed and dropped,
/// so nothing can route traffic back to it. Without a fallback there is nothing
/// to switch to and the primary is kept.
pub struct FailoverTransport {
    primary: Option<Box<dyn ChatTransport>>,
    fallback: Option<Box<dyn ChatTransport>>,
}

impl FailoverTransport {
    pub fn new(primary: Box<dyn ChatTransport>, fallback: Box<dyn ChatTransport>) -> Self {
        Self {
            primary: Some(primary),
            fallback: Some(fallback),
        }
    }

    /// Skips the primary entirely.
    pub fn fallback_only(fallback: Box<dyn ChatTransport>) -> Self {
        Self {
            primary: None,
            fallback: Some(fallback),
        }
    }

    pub fn primary_only(primary: Box<dyn ChatTransport>) -> Self {
        Self {
            primary: Some(primary),
            fallback: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.primary.is_none()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Switches to the fallback. Returns `true` only on the call that actually switched.
    pub async fn fail_over(&mut self) -> bool {
        if self.fallback.is_none() {
            return false;
        }
        match self.primary.take() {
            Some(mut primary) => {
                if let Err(e) = primary.close().await {
                    warn!("Error closing primary transport: {}", e);
                }
                info!("Switched chat transport to fallback");
                true
            }
            None => false,
        }
    }

    fn active(&mut self) -> Result<&mut (dyn ChatTransport + 'static), TransportError> {
        match (self.primary.as_mut(), self.fallback.as_mut()) {
            (Some(primary), _) => Ok(primary.as_mut()),
            (None, Some(fallback)) => Ok(fallback.as_mut()),
            (None, None) => Err(TransportError::NotConnected),
        }
    }
}

#[async_trait]
impl ChatTransport for FailoverTransport {
    fn source(&self) -> TransportSource {
        if self.primary.is_some() {
            TransportSource::Primary
        } else {
            TransportSource::Fallback
        }
    }

    async fn discover(&mut self) -> Result<Option<SessionHandle>, TransportError> {
        self.active()?.discover().await
    }

    async fn fetch_new_messages(&mut self) -> Result<Vec<RawMessage>, TransportError> {
        self.active()?.fetch_new_messages().await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(primary) = self.primary.as_mut() {
            primary.close().await?;
        }
        if let Some(fallback) = self.fallback.as_mut() {
            fallback.close().await?;
        }
        Ok(())
    }
}
