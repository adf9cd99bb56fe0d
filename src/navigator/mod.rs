//! Page navigation for scraping
//!
//! The [`Navigator`] owns the process-wide browser slot and hands out
//! [`Session`]s. Browser backends plug in through [`BrowserLauncher`].

#[cfg(test)]
pub(crate) mod fake;
mod session;
mod traits;
mod webdriver;

pub use session::{Navigator, ScrollOutcome, Session, DEFAULT_NAVIGATION_TIMEOUT};
pub use traits::{BrowserLauncher, BrowserMode, NavigationError, NavigationResult, PageSession};
pub use webdriver::WebDriverLauncher;
