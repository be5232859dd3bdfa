// File: src/platforms/widget/transport.rs

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use chatwarden_common::error::TransportError;
use chatwarden_common::models::{RawMessage, SessionHandle, TransportSource};
use chatwarden_common::traits::ChatTransport;

use super::locate::{default_locators, Locate};
use super::webdriver::WidgetDriver;
use crate::dedup::DedupWindow;

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetConfig {
    pub widget_url: String,
    /// Rows read on the first poll after discovery.
    pub initial_rows: usize,
    /// Rows read on every later poll.
    pub tail_rows: usize,
    /// How many recent row fingerprints are remembered between polls.
    pub recent_rows: usize,
    /// Authors whose rows are widget chrome rather than chat.
    pub system_authors: Vec<String>,
}

impl WidgetConfig {
    pub fn new(widget_url: impl Into<String>) -> Self {
        Self {
            widget_url: widget_url.into(),
            initial_rows: 10,
            tail_rows: 5,
            recent_rows: 100,
            system_authors: vec!["Restream.io".to_string()],
        }
    }
}

/// Fallback transport that scrapes an embeddable chat widget.
///
/// The widget only exposes what is rendered, so "new since last poll" is
/// reconstructed from the fingerprints of recently read rows.
pub struct WidgetTransport {
    config: WidgetConfig,
    driver: Box<dyn WidgetDriver>,
    locators: Vec<Box<dyn Locate>>,
    active: Option<usize>,
    recent: DedupWindow,
    first_poll: bool,
}

impl WidgetTransport {
    pub fn new(config: WidgetConfig, driver: Box<dyn WidgetDriver>) -> Self {
        Self::with_locators(config, driver, default_locators())
    }

    pub fn with_locators(
        config: WidgetConfig,
        driver: Box<dyn WidgetDriver>,
        locators: Vec<Box<dyn Locate>>,
    ) -> Self {
        let recent = DedupWindow::new(config.recent_rows);
        Self {
            config,
            driver,
            locators,
            active: None,
            recent,
            first_poll: true,
        }
    }

    pub fn active_locator(&self) -> Option<&str> {
        self.active
            .and_then(|i| self.locators.get(i))
            .map(|l| l.name())
    }

    fn is_system_author(&self, user: &str) -> bool {
        self.config.system_authors.iter().any(|a| a == user)
    }

    /// Forgets the active locator and releases the dead browser session so the
    /// next discovery opens a fresh one.
    async fn reset_session(&mut self) {
        self.active = None;
        if let Err(e) = self.driver.quit().await {
            debug!("Ignoring teardown error for lost browser session: {}", e);
        }
    }
}

#[async_trait]
impl ChatTransport for WidgetTransport {
    fn source(&self) -> TransportSource {
        TransportSource::Fallback
    }

    async fn discover(&mut self) -> Result<Option<SessionHandle>, TransportError> {
        self.driver.open(&self.config.widget_url).await?;

        for (i, locator) in self.locators.iter().enumerate() {
            let rows = locator.rows(self.driver.as_ref()).await?;
            if !rows.is_empty() {
                info!(
                    "Widget rows found with locator '{}' ({} rendered)",
                    locator.name(),
                    rows.len()
                );
                self.active = Some(i);
                self.first_poll = true;
                return Ok(Some(SessionHandle(format!(
                    "{}#{}",
                    self.config.widget_url,
                    locator.name()
                ))));
            }
        }

        debug!("No chat rows rendered at {} yet", self.config.widget_url);
        self.active = None;
        Ok(None)
    }

    async fn fetch_new_messages(&mut self) -> Result<Vec<RawMessage>, TransportError> {
        let locator = self
            .active
            .and_then(|i| self.locators.get(i))
            .ok_or(TransportError::NotConnected)?;
        let driver = self.driver.as_ref();

        let listed = locator.rows(driver).await;
        let rows = match listed {
            Ok(rows) => rows,
            Err(e) if e.is_session_ended() => {
                self.reset_session().await;
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let take = if self.first_poll {
            self.config.initial_rows
        } else {
            self.config.tail_rows
        };
        let start = rows.len().saturating_sub(take);

        let now = Utc::now();
        let mut batch = Vec::new();
        for row in &rows[start..] {
            let read = locator.read(driver, row).await;
            let rendered = match read {
                Ok(Some(r)) => r,
                Ok(None) => continue,
                Err(e) if e.is_session_ended() => {
                    self.reset_session().await;
                    return Err(e);
                }
                Err(e) => {
                    warn!("Skipping unreadable widget row: {}", e);
                    continue;
                }
            };
            if rendered.text.is_empty() || self.is_system_author(&rendered.user) {
                continue;
            }
            let msg = RawMessage::observed(rendered.user, rendered.text, now);
            if self.recent.accept(&msg) {
                batch.push(msg);
            }
        }

        self.first_poll = false;
        Ok(batch)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.active = None;
        self.driver.quit().await
    }
}
