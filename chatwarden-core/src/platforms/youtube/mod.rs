// File: src/platforms/youtube/mod.rs

pub mod errors;
pub mod feed;

pub use errors::map_api_error;
pub use feed::{YouTubeChatFeed, YouTubeConfig};
