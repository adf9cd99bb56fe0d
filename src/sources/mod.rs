//! Retailer adapters
//!
//! One [`SourceAdapter`] per retailer. Adding a retailer means adding a
//! module here and a [`Source`] variant, never branching inside a shared
//! extractor.

mod cold_storage;
mod fairprice;
mod page;
mod sheng_siong;
mod traits;

pub use cold_storage::ColdStorageAdapter;
pub use fairprice::FairPriceAdapter;
pub use sheng_siong::ShengSiongAdapter;
pub use traits::{
    AdapterError, CardOutcome, CardSkip, ExtractionError, ListingRecord, ScrapeReport, Source,
    SourceAdapter, UnknownSource, PRICE_UNAVAILABLE,
};

use crate::config::{Config, SiteConfig};
use std::sync::Arc;

/// Build the adapter for one configured site.
pub fn adapter_for(site: &SiteConfig) -> Arc<dyn SourceAdapter> {
    match site.source {
        Source::FairPrice => Arc::new(FairPriceAdapter::new(site.clone())),
        Source::ColdStorage => Arc::new(ColdStorageAdapter::new(site.clone())),
        Source::ShengSiong => Arc::new(ShengSiongAdapter::new(site.clone())),
    }
}

/// Adapters for every enabled site, in configured order.
pub fn adapters_from_config(config: &Config) -> Vec<Arc<dyn SourceAdapter>> {
    config.enabled_sites().map(adapter_for).collect()
}
