//! Browser backend trait definitions
//!
//! The navigator talks to browsers only through these two traits. The
//! production backend is [`WebDriverLauncher`](super::WebDriverLauncher);
//! tests supply scripted sessions.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// How the browser window is presented while a source is scraped.
///
/// Some retailers penalize headless browsers, so visibility is chosen per
/// source rather than globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserMode {
    /// No window at all
    #[default]
    Headless,
    /// A real window, minimized right after the first navigation
    Minimized,
}

/// Errors that can occur while launching or driving a browser
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("navigation to {url} failed: {reason}")]
    Load { url: String, reason: String },

    #[error("browser command failed: {0}")]
    Command(String),

    #[error("browser slot closed")]
    SlotClosed,
}

/// Result type for navigation operations
pub type NavigationResult<T> = Result<T, NavigationError>;

/// Starts browser processes.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launch a fresh browser with the given visibility.
    async fn launch(&self, mode: BrowserMode) -> NavigationResult<Box<dyn PageSession>>;
}

/// One live browser, exclusively owned by whoever holds it.
///
/// Implementations do not enforce timeouts themselves; the navigator wraps
/// `goto` in its own navigation deadline.
#[async_trait]
pub trait PageSession: Send {
    /// Load `url` and wait for the document to be ready.
    async fn goto(&mut self, url: &str) -> NavigationResult<()>;

    /// Current `document.body.scrollHeight` in pixels.
    async fn scroll_height(&mut self) -> NavigationResult<u64>;

    /// Scroll the window to the bottom of the document.
    async fn scroll_to_bottom(&mut self) -> NavigationResult<()>;

    /// Serialized HTML of the rendered DOM.
    async fn page_source(&mut self) -> NavigationResult<String>;

    /// Minimize the browser window. Headless browsers treat this as a no-op.
    async fn minimize(&mut self) -> NavigationResult<()>;

    /// Shut the browser down and release all of its resources.
    async fn quit(self: Box<Self>) -> NavigationResult<()>;
}
