//! Pricewatch: grocery price tracking by browser scraping
//!
//! Searches several grocery retailers for the items a household buys most
//! often and appends every listing found to a local SQLite price history.
//!
//! # Core Concepts
//!
//! - **Navigator**: hands out one browser session at a time, always torn down
//! - **Source adapters**: one per retailer, turning a search term into listings
//! - **Orchestrator**: runs every adapter for every item, isolating failures
//! - **Price store**: append-only observation table shared with a dashboard
//!
//! # Example
//!
//! ```
//! use pricewatch::{ObservationFilter, OpenStore, PriceStore, SqliteStore};
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! assert!(store.observations(&ObservationFilter::new()).unwrap().is_empty());
//! ```

pub mod cancel;
pub mod config;
pub mod navigator;
pub mod observation;
pub mod orchestrator;
pub mod sources;
pub mod storage;

pub use cancel::CancellationToken;
pub use config::{Config, ConfigError, SiteConfig};
pub use navigator::{BrowserMode, NavigationError, Navigator, WebDriverLauncher};
pub use observation::{parse_price, PriceObservation};
pub use orchestrator::{Orchestrator, PairFailure, RunSummary};
pub use sources::{adapters_from_config, ListingRecord, Source, SourceAdapter, PRICE_UNAVAILABLE};
pub use storage::{ItemRanking, ObservationFilter, OpenStore, PriceStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
