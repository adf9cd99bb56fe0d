//! Common test utilities for end-to-end scrape runs
//!
//! Provides a scripted browser backend and HTML fixtures shaped like each
//! retailer's search results markup.

pub mod fixtures;
pub mod scripted;

pub use fixtures::{cold_storage_page, fairprice_page, sheng_siong_page};
pub use scripted::ScriptedBrowser;

use pricewatch::Config;

/// Config pointing every retailer at a `.test` host with no scroll pauses.
pub fn test_config() -> Config {
    Config::from_yaml_str(
        r#"
sites:
  fairprice:
    search_url: "https://fairprice.test/search?query={term}"
    scroll_pause_ms: 0
    max_scroll_attempts: 3
  cold_storage:
    search_url: "https://coldstorage.test/search?keyword={term}&page={page}"
    scroll_pause_ms: 0
    max_scroll_attempts: 3
    max_pages: 2
  sheng_siong:
    search_url: "https://shengsiong.test/search/{term}"
    scroll_pause_ms: 0
    max_scroll_attempts: 3
"#,
    )
    .expect("test config parses")
}
