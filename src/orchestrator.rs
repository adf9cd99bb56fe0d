//! Scrape orchestration
//!
//! Drives every registered adapter over every tracked item, one pair at a
//! time, and hands each pair's records to the store. A failure in one
//! (item, source) pair is logged and recorded but never stops the run.

use crate::cancel::CancellationToken;
use crate::navigator::Navigator;
use crate::sources::{Source, SourceAdapter};
use crate::storage::PriceStore;
use std::fmt;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// One (item, source) pair that produced no stored rows because of an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairFailure {
    pub item: String,
    pub source: Source,
    pub error: String,
}

/// Outcome of one pass over all items and adapters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Items whose every adapter was attempted
    pub items_processed: usize,
    /// Non-empty batches committed to the store
    pub batches_stored: usize,
    pub observations_stored: usize,
    pub cards_skipped: usize,
    pub failures: Vec<PairFailure>,
    /// True if the run stopped early on a cancellation request
    pub cancelled: bool,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {} items, {} observations stored, {} cards skipped, {} pairs failed",
            self.items_processed,
            self.observations_stored,
            self.cards_skipped,
            self.failures.len()
        )?;
        if self.cancelled {
            f.write_str(" (cancelled)")?;
        }
        Ok(())
    }
}

/// Runs adapters over tracked items and persists what they find.
///
/// Strictly sequential: items in caller order, adapters in registration
/// order. The navigator's single browser slot would serialize sessions
/// anyway.
pub struct Orchestrator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    navigator: Navigator,
    store: Arc<dyn PriceStore>,
    cancel: Option<CancellationToken>,
}

impl Orchestrator {
    pub fn new(navigator: Navigator, store: Arc<dyn PriceStore>) -> Self {
        Self {
            adapters: Vec::new(),
            navigator,
            store,
            cancel: None,
        }
    }

    /// Add an adapter after those already registered.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.push(adapter);
    }

    /// Stop between pairs once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Scrape every adapter for every item once.
    ///
    /// Never fails as a whole; per-pair errors are collected in the summary.
    pub async fn run_once(&self, ranked_items: &[String]) -> RunSummary {
        let run_id = Uuid::new_v4();
        let span = info_span!("scrape_run", %run_id);
        self.run_items(ranked_items).instrument(span).await
    }

    async fn run_items(&self, ranked_items: &[String]) -> RunSummary {
        let mut summary = RunSummary::default();
        info!(
            items = ranked_items.len(),
            adapters = self.adapters.len(),
            "starting scrape run"
        );

        'items: for item in ranked_items {
            // Stored rows carry the item exactly as ranked so they join back
            if item.trim().is_empty() {
                continue;
            }

            for adapter in &self.adapters {
                if self.is_cancelled() {
                    summary.cancelled = true;
                    break 'items;
                }
                self.run_pair(item, adapter.as_ref(), &mut summary).await;
            }
            summary.items_processed += 1;
        }

        info!(%summary, "scrape run finished");
        summary
    }

    async fn run_pair(&self, item: &str, adapter: &dyn SourceAdapter, summary: &mut RunSummary) {
        let source = adapter.source();

        let report = match adapter.scrape(item, &self.navigator).await {
            Ok(report) => report,
            Err(e) => {
                warn!(item, %source, error = %e, "scrape failed");
                summary.failures.push(PairFailure {
                    item: item.to_string(),
                    source,
                    error: e.to_string(),
                });
                return;
            }
        };

        summary.cards_skipped += report.skipped.len();
        if report.records.is_empty() {
            info!(item, %source, pages = report.pages_visited, "no listings found");
            return;
        }

        match self.store.append(&report.records, item) {
            Ok(written) => {
                info!(item, %source, written, skipped = report.skipped.len(), "batch stored");
                summary.batches_stored += 1;
                summary.observations_stored += written;
            }
            Err(e) => {
                warn!(item, %source, error = %e, "failed to store batch");
                summary.failures.push(PairFailure {
                    item: item.to_string(),
                    source,
                    error: e.to_string(),
                });
            }
        }
    }
}
