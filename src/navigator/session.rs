//! Navigator and the sessions it hands out
//!
//! Every session holds the process-wide browser slot for its whole
//! lifetime. Running several automated browsers against bot-protected
//! retailers at once is unreliable, so at most one session exists at a
//! time no matter how many navigators are constructed.

use super::traits::{BrowserLauncher, BrowserMode, NavigationError, NavigationResult, PageSession};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

/// Default upper bound for a single page load
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// The single permit shared by every navigator in the process.
fn browser_slot() -> Arc<Semaphore> {
    static SLOT: OnceLock<Arc<Semaphore>> = OnceLock::new();
    SLOT.get_or_init(|| Arc::new(Semaphore::new(1))).clone()
}

/// How a scroll-to-load pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    /// Number of scrolls performed, including the one that confirmed no growth
    pub attempts: u32,
    /// True if the page height stopped growing before the attempt cap
    pub stabilized: bool,
}

/// Opens browser sessions, one at a time.
#[derive(Clone)]
pub struct Navigator {
    launcher: Arc<dyn BrowserLauncher>,
    slot: Arc<Semaphore>,
    navigation_timeout: Duration,
}

impl Navigator {
    pub fn new(launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            launcher,
            slot: browser_slot(),
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
        }
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Acquire the browser slot, launch a browser and load `url`.
    ///
    /// Waits for any other open session to close first. If the first load
    /// fails, the browser is shut down before the error is returned.
    pub async fn open(&self, url: &str, mode: BrowserMode) -> NavigationResult<Session> {
        let permit = self
            .slot
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| NavigationError::SlotClosed)?;

        let page = self.launcher.launch(mode).await?;
        let mut session = Session {
            page: Some(page),
            navigation_timeout: self.navigation_timeout,
            permit: Some(permit),
        };

        if let Err(e) = session.goto(url).await {
            session.close().await;
            return Err(e);
        }

        if mode == BrowserMode::Minimized {
            // A window that refuses to minimize is still usable
            if let Err(e) = session.page()?.minimize().await {
                warn!(error = %e, "could not minimize browser window");
            }
        }

        Ok(session)
    }
}

/// An open browser holding the browser slot.
///
/// Call [`Session::close`] when done. Dropping an unclosed session still
/// shuts the browser down in the background and releases the slot only
/// once that shutdown has finished.
pub struct Session {
    page: Option<Box<dyn PageSession>>,
    navigation_timeout: Duration,
    permit: Option<OwnedSemaphorePermit>,
}

impl Session {
    fn page(&mut self) -> NavigationResult<&mut Box<dyn PageSession>> {
        self.page
            .as_mut()
            .ok_or_else(|| NavigationError::Command("session already closed".to_string()))
    }

    /// Load another page in this session, bounded by the navigation timeout.
    pub async fn goto(&mut self, url: &str) -> NavigationResult<()> {
        let timeout = self.navigation_timeout;
        let page = self.page()?;
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Ok(result) => result,
            Err(_) => Err(NavigationError::Timeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    /// Scroll to the bottom until the page stops growing.
    ///
    /// After each scroll the session waits `pause` and re-measures the
    /// document height. The first scroll that does not grow the page ends
    /// the pass; otherwise it ends after `max_attempts` scrolls.
    pub async fn scroll_to_load(
        &mut self,
        pause: Duration,
        max_attempts: u32,
    ) -> NavigationResult<ScrollOutcome> {
        let page = self.page()?;
        let mut last_height = page.scroll_height().await?;

        for attempt in 1..=max_attempts {
            page.scroll_to_bottom().await?;
            tokio::time::sleep(pause).await;
            let height = page.scroll_height().await?;
            debug!(attempt, height, last_height, "scrolled to bottom");

            if height <= last_height {
                return Ok(ScrollOutcome {
                    attempts: attempt,
                    stabilized: true,
                });
            }
            last_height = height;
        }

        Ok(ScrollOutcome {
            attempts: max_attempts,
            stabilized: false,
        })
    }

    /// HTML of the currently rendered page.
    pub async fn page_source(&mut self) -> NavigationResult<String> {
        self.page()?.page_source().await
    }

    /// Shut the browser down and release the browser slot.
    pub async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.quit().await {
                warn!(error = %e, "browser did not shut down cleanly");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };
        let permit = self.permit.take();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = page.quit().await {
                        warn!(error = %e, "browser did not shut down cleanly");
                    }
                    drop(permit);
                });
            }
            Err(_) => {
                warn!("session dropped outside a runtime; browser process may leak");
            }
        }
    }
}
