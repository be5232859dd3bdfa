// File: src/platforms/mod.rs
//
// Chat transports. `youtube` is the structured primary feed, `widget` scrapes an
// embeddable chat widget through a WebDriver session, and `failover` glues the two
// together behind a single ChatTransport.

pub mod failover;
pub mod widget;
pub mod youtube;

pub use failover::FailoverTransport;
pub use widget::{WidgetConfig, WidgetTransport};
pub use youtube::{YouTubeChatFeed, YouTubeConfig};

use chatwarden_common::error::TransportError;
use chatwarden_common::Error;

/// Failures below the HTTP layer (refused connections, timeouts, TLS) are
/// transient from a transport's point of view.
pub(crate) fn network_error(e: Error) -> TransportError {
    TransportError::Network(e.to_string())
}
