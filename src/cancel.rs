//! Stop requests for a scrape run
//!
//! A run looks at its token only between (item, source) pairs, so a stop
//! request never cuts a browser session or a batch write short.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Shared stop flag. Clones observe the same request.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    requested: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Request a stop. Returns true only for the call that made the request.
    pub fn cancel(&self) -> bool {
        !self.requested.swap(true, Ordering::AcqRel)
    }

    /// Cancel on the first Ctrl-C. Must be called from within a tokio runtime.
    pub fn cancel_on_interrupt(&self) -> JoinHandle<()> {
        let token = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() && token.cancel() {
                warn!("interrupt received, stopping after the current search");
            }
        })
    }
}
