// File: src/platforms/widget/mod.rs

pub mod locate;
pub mod transport;
pub mod webdriver;

pub use locate::{default_locators, ClassLocator, CssLocator, Locate, RenderedRow};
pub use transport::{WidgetConfig, WidgetTransport};
pub use webdriver::{ElementId, WebDriverClient, WidgetDriver};
