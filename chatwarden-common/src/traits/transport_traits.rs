use async_trait::async_trait;

use crate::error::TransportError;
use crate::models::{RawMessage, SessionHandle, TransportSource};

/// A source of live chat lines. Implementations keep their own cursor or
/// "last seen" bookkeeping so that successive fetches only return newer lines.
#[async_trait]
pub trait ChatTransport: Send {
    fn source(&self) -> TransportSource;

    /// Looks for an active chat session. `Ok(None)` means nothing is live yet,
    /// which is not an error; the caller idles and asks again later.
    async fn discover(&mut self) -> Result<Option<SessionHandle>, TransportError>;

    /// Returns messages observed since the previous call, oldest first.
    async fn fetch_new_messages(&mut self) -> Result<Vec<RawMessage>, TransportError>;

    /// Releases external resources (browser sessions and the like).
    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}
