// File: src/platforms/widget/webdriver.rs
//
// Minimal W3C WebDriver client, enough to load a chat widget in headless
// Chrome and read rendered rows back out of the DOM.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use chatwarden_common::error::TransportError;
use chatwarden_common::http::{HttpClient, HttpResponse};

use crate::platforms::network_error;

/// Key under which WebDriver returns element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Protocol error codes meaning the browser session (or its window) is gone.
const LOST_SESSION_ERRORS: &[&str] = &["invalid session id", "no such window", "session not created"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementId(pub String);

/// The browser operations the widget scraper needs.
#[async_trait]
pub trait WidgetDriver: Send + Sync {
    /// Navigates to `url`, starting a browser session first if there is none
    /// or if the current one has died.
    async fn open(&mut self, url: &str) -> Result<(), TransportError>;

    async fn find_all(&self, css: &str) -> Result<Vec<ElementId>, TransportError>;

    async fn find_all_within(&self, parent: &ElementId, css: &str) -> Result<Vec<ElementId>, TransportError>;

    async fn text(&self, element: &ElementId) -> Result<String, TransportError>;

    async fn quit(&mut self) -> Result<(), TransportError>;
}

/// Talks to chromedriver (or any W3C endpoint) over HTTP.
pub struct WebDriverClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
    session_id: Option<String>,
    browser_args: Vec<String>,
}

impl WebDriverClient {
    pub fn new(base_url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            session_id: None,
            browser_args: vec![
                "--headless=new".to_string(),
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--disable-gpu".to_string(),
                "--window-size=1920,1080".to_string(),
            ],
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn session_url(&self, path: &str) -> Result<String, TransportError> {
        let id = self.session_id.as_deref().ok_or(TransportError::NotConnected)?;
        Ok(format!(
            "{}/session/{}{}",
            self.base_url,
            urlencoding::encode(id),
            path
        ))
    }

    async fn post(&self, url: &str, body: Value) -> Result<Value, TransportError> {
        let response = self
            .http
            .post_json(url, HashMap::new(), &body)
            .await
            .map_err(network_error)?;
        unwrap_value(response)
    }

    async fn start_session(&mut self) -> Result<(), TransportError> {
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": self.browser_args }
                }
            }
        });
        let value = self
            .post(&format!("{}/session", self.base_url), capabilities)
            .await?;
        let id = value
            .get("sessionId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| TransportError::Driver("session response without sessionId".into()))?;
        info!("Started browser session {}", id);
        self.session_id = Some(id.to_string());
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<(), TransportError> {
        debug!("Navigating browser to {}", url);
        self.post(&self.session_url("/url")?, json!({ "url": url }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WidgetDriver for WebDriverClient {
    async fn open(&mut self, url: &str) -> Result<(), TransportError> {
        if self.session_id.is_none() {
            self.start_session().await?;
        }
        match self.navigate(url).await {
            Err(e) if e.is_session_ended() => {
                warn!("Browser session lost ({}); starting a new one", e);
                self.session_id = None;
                self.start_session().await?;
                self.navigate(url).await
            }
            other => other,
        }
    }

    async fn find_all(&self, css: &str) -> Result<Vec<ElementId>, TransportError> {
        let value = self
            .post(
                &self.session_url("/elements")?,
                json!({ "using": "css selector", "value": css }),
            )
            .await?;
        Ok(element_ids(&value))
    }

    async fn find_all_within(&self, parent: &ElementId, css: &str) -> Result<Vec<ElementId>, TransportError> {
        let path = format!("/element/{}/elements", urlencoding::encode(&parent.0));
        let value = self
            .post(
                &self.session_url(&path)?,
                json!({ "using": "css selector", "value": css }),
            )
            .await?;
        Ok(element_ids(&value))
    }

    async fn text(&self, element: &ElementId) -> Result<String, TransportError> {
        let path = format!("/element/{}/text", urlencoding::encode(&element.0));
        let response = self
            .http
            .get(&self.session_url(&path)?, HashMap::new())
            .await
            .map_err(network_error)?;
        let value = unwrap_value(response)?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn quit(&mut self) -> Result<(), TransportError> {
        let url = match self.session_url("") {
            Ok(url) => url,
            Err(_) => return Ok(()),
        };
        self.session_id = None;
        let response = self.http.delete(&url).await.map_err(network_error)?;
        if !response.is_success() {
            warn!("Browser session teardown returned HTTP {}", response.status);
        }
        Ok(())
    }
}

/// Pulls `value` out of a WebDriver reply. A dead session becomes
/// `SessionEnded`; any other protocol error becomes `Driver`.
fn unwrap_value(response: HttpResponse) -> Result<Value, TransportError> {
    let parsed: Value = serde_json::from_str(&response.body)
        .map_err(|e| TransportError::Parse(format!("webdriver reply: {e}")))?;
    let value = parsed.get("value").cloned().unwrap_or(Value::Null);

    if !response.is_success() {
        let kind = value.get("error").and_then(|e| e.as_str()).unwrap_or("unknown error");
        let message = value.get("message").and_then(|m| m.as_str()).unwrap_or("");
        if LOST_SESSION_ERRORS.contains(&kind) {
            return Err(TransportError::SessionEnded(format!("{kind}: {message}")));
        }
        return Err(TransportError::Driver(format!("{kind}: {message}")));
    }
    Ok(value)
}

fn element_ids(value: &Value) -> Vec<ElementId> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(ELEMENT_KEY).and_then(|id| id.as_str()))
                .map(|id| ElementId(id.to_string()))
                .collect()
        })
        .unwrap_or_default()
}
