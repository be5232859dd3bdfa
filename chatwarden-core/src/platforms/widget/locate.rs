// File: src/platforms/widget/locate.rs
//
// Row-locator strategies for chat widgets. The markup differs between widget
// vendors and changes without notice, so discovery walks an ordered list of
// locators and keeps the first one that finds any rows.

use async_trait::async_trait;

use chatwarden_common::error::TransportError;

use super::webdriver::{ElementId, WidgetDriver};

/// Author and text read out of one rendered chat row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub user: String,
    pub text: String,
}

#[async_trait]
pub trait Locate: Send + Sync {
    fn name(&self) -> &str;

    /// Every chat row currently rendered, in DOM (chronological) order.
    async fn rows(&self, driver: &dyn WidgetDriver) -> Result<Vec<ElementId>, TransportError>;

    /// `Ok(None)` when the row lacks an author or text node.
    async fn read(&self, driver: &dyn WidgetDriver, row: &ElementId) -> Result<Option<RenderedRow>, TransportError>;
}

/// Tries each selector in turn and returns the trimmed text of the first match.
async fn first_text(
    driver: &dyn WidgetDriver,
    row: &ElementId,
    selectors: &[String],
) -> Result<Option<String>, TransportError> {
    for selector in selectors {
        if let Some(el) = driver.find_all_within(row, selector).await?.first() {
            return Ok(Some(driver.text(el).await?.trim().to_string()));
        }
    }
    Ok(None)
}

async fn read_row(
    driver: &dyn WidgetDriver,
    row: &ElementId,
    user_selectors: &[String],
    text_selectors: &[String],
) -> Result<Option<RenderedRow>, TransportError> {
    let user = match first_text(driver, row, user_selectors).await? {
        Some(u) if !u.is_empty() => u,
        _ => return Ok(None),
    };
    let text = match first_text(driver, row, text_selectors).await? {
        Some(t) => t,
        None => return Ok(None),
    };
    Ok(Some(RenderedRow { user, text }))
}

/// Rows located by a CSS class name; author and text nodes by candidate classes.
pub struct ClassLocator {
    class_name: String,
    row_selector: String,
    user_selectors: Vec<String>,
    text_selectors: Vec<String>,
}

impl ClassLocator {
    pub fn new(class_name: &str, user_classes: &[&str], text_classes: &[&str]) -> Self {
        Self {
            class_name: class_name.to_string(),
            row_selector: format!(".{class_name}"),
            user_selectors: class_selectors(user_classes),
            text_selectors: class_selectors(text_classes),
        }
    }
}

fn class_selectors(classes: &[&str]) -> Vec<String> {
    classes.iter().map(|c| format!(".{c}")).collect()
}

#[async_trait]
impl Locate for ClassLocator {
    fn name(&self) -> &str {
        &self.class_name
    }

    async fn rows(&self, driver: &dyn WidgetDriver) -> Result<Vec<ElementId>, TransportError> {
        driver.find_all(&self.row_selector).await
    }

    async fn read(&self, driver: &dyn WidgetDriver, row: &ElementId) -> Result<Option<RenderedRow>, TransportError> {
        read_row(driver, row, &self.user_selectors, &self.text_selectors).await
    }
}

/// Fully explicit CSS selectors, for widgets with stable element ids.
pub struct CssLocator {
    name: String,
    row_selector: String,
    user_selectors: Vec<String>,
    text_selectors: Vec<String>,
}

impl CssLocator {
    pub fn new(name: &str, row_selector: &str, user_selector: &str, text_selector: &str) -> Self {
        Self {
            name: name.to_string(),
            row_selector: row_selector.to_string(),
            user_selectors: vec![user_selector.to_string()],
            text_selectors: vec![text_selector.to_string()],
        }
    }
}

#[async_trait]
impl Locate for CssLocator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn rows(&self, driver: &dyn WidgetDriver) -> Result<Vec<ElementId>, TransportError> {
        driver.find_all(&self.row_selector).await
    }

    async fn read(&self, driver: &dyn WidgetDriver, row: &ElementId) -> Result<Option<RenderedRow>, TransportError> {
        read_row(driver, row, &self.user_selectors, &self.text_selectors).await
    }
}

const USER_CLASSES: &[&str] = &["message-sender", "chat-author", "username"];
const TEXT_CLASSES: &[&str] = &["chat-text-normal", "message-text", "chat-message-text"];

const ROW_CLASSES: &[&str] = &[
    "message-info-container",
    "chat-message",
    "message",
    "chat-item",
    "message-item",
    "chat-line",
    "rs-chat-message",
    "chat-messages",
    "message-wrapper",
    "chat-message-wrapper",
];

/// Restream-style class locators first, then the YouTube popout chat renderer.
pub fn default_locators() -> Vec<Box<dyn Locate>> {
    let mut locators: Vec<Box<dyn Locate>> = ROW_CLASSES
        .iter()
        .map(|class| Box::new(ClassLocator::new(class, USER_CLASSES, TEXT_CLASSES)) as Box<dyn Locate>)
        .collect();
    locators.push(Box::new(CssLocator::new(
        "youtube-popout",
        "#items yt-live-chat-text-message-renderer",
        "#author-name",
        "#message",
    )));
    locators
}
