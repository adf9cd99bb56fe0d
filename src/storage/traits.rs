//! Storage trait definitions

use crate::observation::PriceObservation;
use crate::sources::{ListingRecord, Source};
use chrono::{DateTime, Utc};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Store connection lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Filter criteria for reading observations back
#[derive(Debug, Clone, Default)]
pub struct ObservationFilter {
    /// Only rows produced by this search term
    pub searched_item: Option<String>,
    /// Only rows with this source label as stored
    pub source: Option<String>,
    /// Inclusive lower bound on `observed_at`
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `observed_at`
    pub until: Option<DateTime<Utc>>,
    /// Keep only the most recent N matches
    pub limit: Option<usize>,
}

impl ObservationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, searched_item: impl Into<String>) -> Self {
        self.searched_item = Some(searched_item.into());
        self
    }

    /// Restrict to one retailer. Known retailers may be named by label or
    /// config key in any case; anything else is matched verbatim.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        let source = source.into();
        let label = match source.parse::<Source>() {
            Ok(known) => known.label().to_string(),
            Err(_) => source,
        };
        self.source = Some(label);
        self
    }

    pub fn since(mut self, at: DateTime<Utc>) -> Self {
        self.since = Some(at);
        self
    }

    pub fn until(mut self, at: DateTime<Utc>) -> Self {
        self.until = Some(at);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True if `at` falls inside the time bounds.
    pub fn covers(&self, at: &DateTime<Utc>) -> bool {
        self.since.map_or(true, |s| *at >= s) && self.until.map_or(true, |u| *at <= u)
    }
}

/// Append-only store of price observations.
///
/// Implementations must be thread-safe (Send + Sync); dashboard readers
/// may query while a batch is being written.
pub trait PriceStore: Send + Sync {
    /// Write one (item, source) batch.
    ///
    /// Every record becomes one row tagged with `searched_item` and a
    /// single `observed_at` taken when the batch is written. The batch is
    /// committed as a whole or not at all. Returns the number of rows
    /// written.
    fn append(&self, records: &[ListingRecord], searched_item: &str) -> StorageResult<usize>;

    /// Read observations matching `filter`, oldest first, in insertion
    /// order within a timestamp. With a limit, the most recent `limit`
    /// matches are returned. Rows whose timestamp cannot be read are
    /// skipped.
    fn observations(&self, filter: &ObservationFilter) -> StorageResult<Vec<PriceObservation>>;

    /// Total number of stored observations
    fn observation_count(&self) -> StorageResult<usize>;
}

/// Supplies the item names worth tracking.
pub trait ItemRanking: Send + Sync {
    /// Up to `n` item descriptions, most frequently purchased first.
    fn top_items(&self, n: usize) -> StorageResult<Vec<String>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: PriceStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
