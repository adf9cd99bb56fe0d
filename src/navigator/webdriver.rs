//! Chrome over W3C WebDriver, driven by `thirtyfour`
//!
//! Expects a chromedriver (or compatible) server at `server_url`; each
//! launch creates a new WebDriver session on it.

use super::traits::{BrowserLauncher, BrowserMode, NavigationError, NavigationResult, PageSession};
use async_trait::async_trait;
use std::time::Duration;
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;

const HEIGHT_SCRIPT: &str = "return document.body.scrollHeight;";
const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Flags that make an automated Chrome look less like one
const STEALTH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--window-size=1366,900",
    "--lang=en-US",
];

/// Launches Chrome sessions through a WebDriver server.
#[derive(Debug, Clone)]
pub struct WebDriverLauncher {
    server_url: String,
    page_load_timeout: Duration,
}

impl WebDriverLauncher {
    pub fn new(server_url: impl Into<String>, page_load_timeout: Duration) -> Self {
        Self {
            server_url: server_url.into(),
            page_load_timeout,
        }
    }
}

fn launch_error(e: WebDriverError) -> NavigationError {
    NavigationError::Launch(e.to_string())
}

fn command_error(e: WebDriverError) -> NavigationError {
    NavigationError::Command(e.to_string())
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self, mode: BrowserMode) -> NavigationResult<Box<dyn PageSession>> {
        let mut caps = DesiredCapabilities::chrome();
        if mode == BrowserMode::Headless {
            caps.set_headless().map_err(launch_error)?;
        }
        for arg in STEALTH_ARGS {
            caps.add_arg(arg).map_err(launch_error)?;
        }

        let driver = WebDriver::new(self.server_url.as_str(), caps)
            .await
            .map_err(launch_error)?;

        if let Err(e) = driver.set_page_load_timeout(self.page_load_timeout).await {
            let _ = driver.quit().await;
            return Err(launch_error(e));
        }

        tracing::debug!(server = %self.server_url, ?mode, "webdriver session started");
        Ok(Box::new(WebDriverPage { driver }))
    }
}

struct WebDriverPage {
    driver: WebDriver,
}

#[async_trait]
impl PageSession for WebDriverPage {
    async fn goto(&mut self, url: &str) -> NavigationResult<()> {
        self.driver
            .goto(url)
            .await
            .map_err(|e| NavigationError::Load {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn scroll_height(&mut self) -> NavigationResult<u64> {
        let ret = self
            .driver
            .execute(HEIGHT_SCRIPT, Vec::new())
            .await
            .map_err(command_error)?;
        let value: &serde_json::Value = ret.json();
        value
            .as_u64()
            .or_else(|| value.as_f64().map(|h| h.max(0.0) as u64))
            .ok_or_else(|| NavigationError::Command(format!("unexpected page height: {}", value)))
    }

    async fn scroll_to_bottom(&mut self) -> NavigationResult<()> {
        self.driver
            .execute(SCROLL_SCRIPT, Vec::new())
            .await
            .map(|_| ())
            .map_err(command_error)
    }

    async fn page_source(&mut self) -> NavigationResult<String> {
        self.driver.source().await.map_err(command_error)
    }

    async fn minimize(&mut self) -> NavigationResult<()> {
        self.driver.minimize_window().await.map_err(command_error)
    }

    async fn quit(self: Box<Self>) -> NavigationResult<()> {
        self.driver.quit().await.map_err(command_error)
    }
}
