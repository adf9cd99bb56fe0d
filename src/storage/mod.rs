//! Storage backends for price observations
//!
//! Writers go through the `PriceStore` trait and ranking reads through
//! `ItemRanking`. `SqliteStore` implements both against one database file.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{ItemRanking, ObservationFilter, OpenStore, PriceStore, StorageError, StorageResult};
