//! Scraper configuration
//!
//! Loaded from an optional YAML file. Every field has a default, and each
//! retailer block only needs the keys it wants to change:
//!
//! ```yaml
//! webdriver_url: http://localhost:9515
//! navigation_timeout_secs: 30
//! sites:
//!   sheng_siong:
//!     browser: headless
//!   cold_storage:
//!     max_pages: 5
//! ```

use crate::navigator::BrowserMode;
use crate::sources::Source;
use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TOP_ITEMS: usize = 5;
/// Singapore time, where all three retailers operate
pub const DEFAULT_DISPLAY_UTC_OFFSET_HOURS: i32 = 8;

/// Errors that make a scrape run impossible to start
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("webdriver_url is empty")]
    MissingWebDriverUrl,

    #[error("database path is empty")]
    MissingDatabase,

    #[error("navigation_timeout_secs must be greater than zero")]
    ZeroNavigationTimeout,

    #[error("search_url for {site} {reason}")]
    InvalidSearchUrl { site: Source, reason: &'static str },

    #[error("display_utc_offset_hours {0} is out of range")]
    InvalidDisplayOffset(i32),

    #[error("no sources are enabled")]
    NoEnabledSources,
}

/// Per-retailer scraping settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub source: Source,
    pub enabled: bool,
    /// Search page URL with `{term}` and, for paginated sites, `{page}`
    pub search_url: String,
    pub browser: BrowserMode,
    pub scroll_pause: Duration,
    pub max_scroll_attempts: u32,
    /// Result pages to visit; 1 means the site is not paginated
    pub max_pages: u32,
}

impl SiteConfig {
    /// Built-in settings for a retailer.
    pub fn defaults_for(source: Source) -> Self {
        match source {
            Source::FairPrice => Self {
                source,
                enabled: true,
                search_url: "https://www.fairprice.com.sg/search?query={term}".to_string(),
                browser: BrowserMode::Headless,
                scroll_pause: Duration::from_millis(1200),
                max_scroll_attempts: 10,
                max_pages: 1,
            },
            Source::ColdStorage => Self {
                source,
                enabled: true,
                search_url: "https://coldstorage.com.sg/en/search?keyword={term}&page={page}".to_string(),
                browser: BrowserMode::Headless,
                scroll_pause: Duration::from_millis(1000),
                max_scroll_attempts: 5,
                max_pages: 3,
            },
            Source::ShengSiong => Self {
                source,
                enabled: true,
                search_url: "https://shengsiong.com.sg/search/{term}".to_string(),
                browser: BrowserMode::Minimized,
                scroll_pause: Duration::from_millis(1500),
                max_scroll_attempts: 5,
                max_pages: 1,
            },
        }
    }

    /// Search URL for `term` on the given page, with the term embedded as-is.
    pub fn search_url_for(&self, term: &str, page: u32) -> String {
        // {page} first so a term containing "{page}" survives verbatim
        self.search_url
            .replace("{page}", &page.to_string())
            .replace("{term}", term)
    }

    pub fn is_paginated(&self) -> bool {
        self.max_pages > 1
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason| ConfigError::InvalidSearchUrl {
            site: self.source,
            reason,
        };
        if !self.search_url.contains("{term}") {
            return Err(invalid("has no {term} placeholder"));
        }
        if self.is_paginated() && !self.search_url.contains("{page}") {
            return Err(invalid("has no {page} placeholder but max_pages > 1"));
        }
        if self.max_pages == 0 {
            return Err(invalid("is unusable with max_pages = 0"));
        }
        Ok(())
    }
}

/// Optional per-site keys as they appear in the YAML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SiteOverrides {
    enabled: Option<bool>,
    search_url: Option<String>,
    browser: Option<BrowserMode>,
    scroll_pause_ms: Option<u64>,
    max_scroll_attempts: Option<u32>,
    max_pages: Option<u32>,
}

impl SiteOverrides {
    fn apply(self, mut site: SiteConfig) -> SiteConfig {
        if let Some(enabled) = self.enabled {
            site.enabled = enabled;
        }
        if let Some(url) = self.search_url {
            site.search_url = url;
        }
        if let Some(browser) = self.browser {
            site.browser = browser;
        }
        if let Some(ms) = self.scroll_pause_ms {
            site.scroll_pause = Duration::from_millis(ms);
        }
        if let Some(attempts) = self.max_scroll_attempts {
            site.max_scroll_attempts = attempts;
        }
        if let Some(pages) = self.max_pages {
            site.max_pages = pages;
        }
        site
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SitesFile {
    fairprice: SiteOverrides,
    cold_storage: SiteOverrides,
    sheng_siong: SiteOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    webdriver_url: Option<String>,
    database: Option<PathBuf>,
    navigation_timeout_secs: Option<u64>,
    top_items: Option<usize>,
    display_utc_offset_hours: Option<i32>,
    sites: SitesFile,
}

/// Resolved configuration for a scrape run
#[derive(Debug, Clone)]
pub struct Config {
    pub webdriver_url: String,
    /// `None` lets the caller pick its default location
    pub database: Option<PathBuf>,
    pub navigation_timeout: Duration,
    /// How many ranked items to scrape when none are given explicitly
    pub top_items: usize,
    pub display_utc_offset_hours: i32,
    /// One entry per retailer, in scraping order
    pub sites: Vec<SiteConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            database: None,
            navigation_timeout: Duration::from_secs(DEFAULT_NAVIGATION_TIMEOUT_SECS),
            top_items: DEFAULT_TOP_ITEMS,
            display_utc_offset_hours: DEFAULT_DISPLAY_UTC_OFFSET_HOURS,
            sites: Source::ALL.into_iter().map(SiteConfig::defaults_for).collect(),
        }
    }
}

impl Config {
    /// Parse YAML, filling anything missing with defaults. Does not validate.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty map
        let file: ConfigFile = if yaml.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        let defaults = Config::default();

        let SitesFile {
            fairprice,
            cold_storage,
            sheng_siong,
        } = file.sites;
        let sites = vec![
            fairprice.apply(SiteConfig::defaults_for(Source::FairPrice)),
            cold_storage.apply(SiteConfig::defaults_for(Source::ColdStorage)),
            sheng_siong.apply(SiteConfig::defaults_for(Source::ShengSiong)),
        ];

        Ok(Self {
            webdriver_url: file.webdriver_url.unwrap_or(defaults.webdriver_url),
            database: file.database,
            navigation_timeout: file
                .navigation_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.navigation_timeout),
            top_items: file.top_items.unwrap_or(defaults.top_items),
            display_utc_offset_hours: file
                .display_utc_offset_hours
                .unwrap_or(defaults.display_utc_offset_hours),
            sites,
        })
    }

    /// Read and parse a config file. Does not validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check everything a run needs before any browser is started.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webdriver_url.trim().is_empty() {
            return Err(ConfigError::MissingWebDriverUrl);
        }
        if let Some(db) = &self.database {
            if db.as_os_str().is_empty() {
                return Err(ConfigError::MissingDatabase);
            }
        }
        if self.navigation_timeout.is_zero() {
            return Err(ConfigError::ZeroNavigationTimeout);
        }
        if !(-12..=14).contains(&self.display_utc_offset_hours) {
            return Err(ConfigError::InvalidDisplayOffset(self.display_utc_offset_hours));
        }
        for site in self.enabled_sites() {
            site.validate()?;
        }
        if self.enabled_sites().next().is_none() {
            return Err(ConfigError::NoEnabledSources);
        }
        Ok(())
    }

    pub fn enabled_sites(&self) -> impl Iterator<Item = &SiteConfig> {
        self.sites.iter().filter(|s| s.enabled)
    }

    pub fn site(&self, source: Source) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.source == source)
    }

    /// Fixed offset used when showing timestamps to people.
    pub fn display_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.display_utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }
}
