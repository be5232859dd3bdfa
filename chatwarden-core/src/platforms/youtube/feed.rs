// File: src/platforms/youtube/feed.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use chatwarden_common::error::TransportError;
use chatwarden_common::http::{HttpClient, HttpResponse};
use chatwarden_common::models::{RawMessage, SessionHandle, TransportSource};
use chatwarden_common::traits::ChatTransport;

use super::errors::map_api_error;
use crate::platforms::network_error;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub api_key: String,
    pub channel_id: String,
    pub api_base: String,
}

impl YouTubeConfig {
    pub fn new(api_key: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            channel_id: channel_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    live_streaming_details: Option<LiveStreamingDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveStreamingDetails {
    active_live_chat_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveChatPage {
    next_page_token: Option<String>,
    #[serde(default)]
    items: Vec<LiveChatItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveChatItem {
    snippet: LiveChatSnippet,
    author_details: AuthorDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveChatSnippet {
    published_at: Option<DateTime<Utc>>,
    display_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorDetails {
    display_name: String,
}

/// Live chat over the YouTube Data API v3.
///
/// Discovery costs a `search.list` plus a `videos.list`; each poll is one
/// `liveChatMessages.list` continuing from the previous `nextPageToken`.
pub struct YouTubeChatFeed {
    config: YouTubeConfig,
    http: Arc<dyn HttpClient>,
    live_chat_id: Option<String>,
    page_token: Option<String>,
}

impl YouTubeChatFeed {
    pub fn new(config: YouTubeConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http,
            live_chat_id: None,
            page_token: None,
        }
    }

    pub fn live_chat_id(&self) -> Option<&str> {
        self.live_chat_id.as_deref()
    }

    fn endpoint(&self, resource: &str, params: &[(&str, &str)]) -> Result<Url, TransportError> {
        let base = format!("{}/{}", self.config.api_base.trim_end_matches('/'), resource);
        let mut all: Vec<(&str, &str)> = params.to_vec();
        all.push(("key", self.config.api_key.as_str()));
        Url::parse_with_params(&base, &all).map_err(|e| TransportError::Parse(format!("bad url {base}: {e}")))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Result<T, TransportError> {
        debug!("GET {}", redact_key(&url));
        let response: HttpResponse = self
            .http
            .get(url.as_str(), HashMap::new())
            .await
            .map_err(network_error)?;

        if !response.is_success() {
            return Err(map_api_error(response.status, &response.body));
        }
        serde_json::from_str(&response.body)
            .map_err(|e| TransportError::Parse(format!("unexpected API payload: {e}")))
    }
}

#[async_trait]
impl ChatTransport for YouTubeChatFeed {
    fn source(&self) -> TransportSource {
        TransportSource::Primary
    }

    async fn discover(&mut self) -> Result<Option<SessionHandle>, TransportError> {
        let search_url = self.endpoint(
            "search",
            &[
                ("part", "id"),
                ("channelId", self.config.channel_id.as_str()),
                ("eventType", "live"),
                ("type", "video"),
                ("maxResults", "1"),
            ],
        )?;
        let search: SearchResponse = self.get_json(search_url).await?;

        let video_id = match search.items.into_iter().find_map(|i| i.id.video_id) {
            Some(id) => id,
            None => {
                debug!("No live broadcast on channel {}", self.config.channel_id);
                return Ok(None);
            }
        };

        let videos_url = self.endpoint(
            "videos",
            &[("part", "liveStreamingDetails"), ("id", video_id.as_str())],
        )?;
        let videos: VideosResponse = self.get_json(videos_url).await?;

        let chat_id = videos
            .items
            .into_iter()
            .filter_map(|v| v.live_streaming_details)
            .find_map(|d| d.active_live_chat_id);

        match chat_id {
            Some(id) => {
                info!("Found live chat {} for video {}", id, video_id);
                self.live_chat_id = Some(id.clone());
                self.page_token = None;
                Ok(Some(SessionHandle(id)))
            }
            None => {
                debug!("Video {} has no active live chat", video_id);
                Ok(None)
            }
        }
    }

    async fn fetch_new_messages(&mut self) -> Result<Vec<RawMessage>, TransportError> {
        let chat_id = self.live_chat_id.clone().ok_or(TransportError::NotConnected)?;

        let mut params = vec![
            ("liveChatId", chat_id.as_str()),
            ("part", "snippet,authorDetails"),
        ];
        if let Some(token) = self.page_token.as_deref() {
            params.push(("pageToken", token));
        }
        let url = self.endpoint("liveChat/messages", &params)?;

        let page: LiveChatPage = match self.get_json(url).await {
            Ok(page) => page,
            Err(e) => {
                if e.is_session_ended() {
                    self.live_chat_id = None;
                    self.page_token = None;
                }
                return Err(e);
            }
        };

        if page.next_page_token.is_some() {
            self.page_token = page.next_page_token;
        }

        let mut batch: Vec<RawMessage> = page
            .items
            .into_iter()
            .filter_map(|item| {
                let text = item.snippet.display_message?;
                let observed_at = item.snippet.published_at.unwrap_or_else(Utc::now);
                Some(RawMessage::observed(item.author_details.display_name, text, observed_at))
            })
            .collect();

        batch.sort_by_key(|m| m.observed_at);
        Ok(batch)
    }
}

fn redact_key(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "key" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_api_key_in_logs() {
        let url = Url::parse("https://example.test/v3/search?part=id&key=SECRET").unwrap();
        let shown = redact_key(&url);
        assert!(!shown.contains("SECRET"));
        assert!(shown.contains("part=id"));
    }
}
