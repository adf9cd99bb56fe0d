//! Persisted price observations and their read-side helpers

use crate::sources::Source;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// One stored row: a listing seen at a point in time for a search term.
///
/// `item_name` is whatever the retailer called the product and is linked
/// to `searched_item` only by the search that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceObservation {
    pub observed_at: DateTime<Utc>,
    /// Source label as stored
    pub source: String,
    pub item_name: String,
    pub price: String,
    pub searched_item: String,
}

impl PriceObservation {
    /// The retailer, if the stored label is one this crate knows.
    pub fn source_kind(&self) -> Option<Source> {
        self.source.parse().ok()
    }

    /// Numeric price, or `None` when the display string is not `$` + decimal.
    pub fn price_value(&self) -> Option<f64> {
        parse_price(&self.price)
    }

    pub fn observed_local(&self, offset: FixedOffset) -> DateTime<FixedOffset> {
        self.observed_at.with_timezone(&offset)
    }
}

/// Parse a display price such as `$1,234.50` into a number.
///
/// Thousands separators are tolerated. Anything else, including the
/// "price unavailable" sentinel, yields `None` so callers can leave the
/// row out of numeric aggregation.
pub fn parse_price(display: &str) -> Option<f64> {
    let digits = display.trim().strip_prefix('$')?.trim_start().replace(',', "");
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    digits.parse::<f64>().ok()
}
