//! Source adapter contract and the records it produces

use crate::navigator::{NavigationError, Navigator};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stored in place of a price when a card shows none.
pub const PRICE_UNAVAILABLE: &str = "N/A";

/// A supported retailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    FairPrice,
    ColdStorage,
    ShengSiong,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::FairPrice, Source::ColdStorage, Source::ShengSiong];

    /// The label written to the `source` column.
    pub fn label(&self) -> &'static str {
        match self {
            Source::FairPrice => "FairPrice",
            Source::ColdStorage => "Cold Storage",
            Source::ShengSiong => "Sheng Siong",
        }
    }

    /// The key used for this retailer in config files.
    pub fn key(&self) -> &'static str {
        match self {
            Source::FairPrice => "fairprice",
            Source::ColdStorage => "cold_storage",
            Source::ShengSiong => "sheng_siong",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
#[error("unknown source: {0}")]
pub struct UnknownSource(pub String);

impl FromStr for Source {
    type Err = UnknownSource;

    /// Accepts either the stored label or the config key, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Source::ALL
            .into_iter()
            .find(|src| src.label().eq_ignore_ascii_case(wanted) || src.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownSource(s.to_string()))
    }
}

/// One product as listed on a retailer's search results page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub source: Source,
    /// The retailer's own product label
    pub name: String,
    /// Display price, formatting preserved, or [`PRICE_UNAVAILABLE`]
    pub price: String,
}

impl ListingRecord {
    pub fn new(source: Source, name: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            price: price.into(),
        }
    }

    /// True when the card carried no price.
    pub fn price_unavailable(&self) -> bool {
        self.price == PRICE_UNAVAILABLE
    }
}

/// Why a single product card could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no name element")]
    MissingName,

    #[error("name element is empty")]
    EmptyName,
}

/// A card that was skipped, with its position on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSkip {
    /// 1-based page number
    pub page: u32,
    /// 0-based card position on that page
    pub index: usize,
    pub reason: ExtractionError,
}

/// Result of extracting one card.
pub type CardOutcome = Result<ListingRecord, CardSkip>;

/// Everything one adapter found for one search term.
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    pub source: Source,
    /// Records in page order, then card order
    pub records: Vec<ListingRecord>,
    pub skipped: Vec<CardSkip>,
    /// Result pages read, including a final empty one
    pub pages_visited: u32,
}

impl ScrapeReport {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            records: Vec::new(),
            skipped: Vec::new(),
            pages_visited: 0,
        }
    }

    /// Fold one page's card outcomes into the report, keeping card order.
    pub fn absorb(&mut self, outcomes: Vec<CardOutcome>) {
        for outcome in outcomes {
            match outcome {
                Ok(record) => self.records.push(record),
                Err(skip) => self.skipped.push(skip),
            }
        }
    }

    pub fn cards_seen(&self) -> usize {
        self.records.len() + self.skipped.len()
    }
}

/// Errors that end one adapter's work for one search term
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("invalid selector {selector:?}: {reason}")]
    Selector { selector: String, reason: String },
}

/// One retailer's way of turning a search term into listings.
///
/// Implementations own their source label and tag every record with it.
/// They must close every session they open, whether or not extraction
/// succeeded.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The retailer this adapter scrapes
    fn source(&self) -> Source;

    /// Search the retailer for `term` and extract every listed product.
    async fn scrape(&self, term: &str, navigator: &Navigator) -> Result<ScrapeReport, AdapterError>;
}
