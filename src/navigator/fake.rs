//! Scripted in-process browser for unit tests

use super::traits::{BrowserLauncher, BrowserMode, NavigationError, NavigationResult, PageSession};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeState {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    heights: Vec<u64>,
    visited: Vec<String>,
    modes: Vec<BrowserMode>,
    launches: usize,
    quits: usize,
    scrolls: u32,
    minimized: usize,
}

/// A launcher whose sessions serve canned HTML keyed by URL.
///
/// Unknown URLs load as an empty document. Every session reports page
/// heights from the shared `heights` script, indexed by how many times
/// that session has scrolled.
#[derive(Clone, Default)]
pub(crate) struct FakeBrowser {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBrowser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(self, url: &str, html: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(url.to_string(), html.to_string());
        self
    }

    pub(crate) fn failing(self, url: &str) -> Self {
        self.state.lock().unwrap().failing.insert(url.to_string());
        self
    }

    pub(crate) fn hanging(self, url: &str) -> Self {
        self.state.lock().unwrap().hanging.insert(url.to_string());
        self
    }

    pub(crate) fn with_heights(self, heights: Vec<u64>) -> Self {
        self.state.lock().unwrap().heights = heights;
        self
    }

    pub(crate) fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }

    pub(crate) fn modes(&self) -> Vec<BrowserMode> {
        self.state.lock().unwrap().modes.clone()
    }

    pub(crate) fn launches(&self) -> usize {
        self.state.lock().unwrap().launches
    }

    pub(crate) fn quits(&self) -> usize {
        self.state.lock().unwrap().quits
    }

    pub(crate) fn scrolls(&self) -> u32 {
        self.state.lock().unwrap().scrolls
    }

    pub(crate) fn minimized(&self) -> usize {
        self.state.lock().unwrap().minimized
    }
}

#[async_trait]
impl BrowserLauncher for FakeBrowser {
    async fn launch(&self, mode: BrowserMode) -> NavigationResult<Box<dyn PageSession>> {
        {
            let mut state = self.state.lock().unwrap();
            state.launches += 1;
            state.modes.push(mode);
        }
        Ok(Box::new(FakePage {
            state: self.state.clone(),
            current: None,
            scrolled: 0,
        }))
    }
}

struct FakePage {
    state: Arc<Mutex<FakeState>>,
    current: Option<String>,
    scrolled: usize,
}

#[async_trait]
impl PageSession for FakePage {
    async fn goto(&mut self, url: &str) -> NavigationResult<()> {
        let hang = {
            let mut state = self.state.lock().unwrap();
            state.visited.push(url.to_string());
            if state.failing.contains(url) {
                return Err(NavigationError::Load {
                    url: url.to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            state.hanging.contains(url)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        self.current = Some(url.to_string());
        self.scrolled = 0;
        Ok(())
    }

    async fn scroll_height(&mut self) -> NavigationResult<u64> {
        let state = self.state.lock().unwrap();
        if state.heights.is_empty() {
            return Ok(1000);
        }
        let idx = self.scrolled.min(state.heights.len() - 1);
        Ok(state.heights[idx])
    }

    async fn scroll_to_bottom(&mut self) -> NavigationResult<()> {
        self.scrolled += 1;
        self.state.lock().unwrap().scrolls += 1;
        Ok(())
    }

    async fn page_source(&mut self) -> NavigationResult<String> {
        let state = self.state.lock().unwrap();
        Ok(self
            .current
            .as_ref()
            .and_then(|url| state.pages.get(url).cloned())
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn minimize(&mut self) -> NavigationResult<()> {
        self.state.lock().unwrap().minimized += 1;
        Ok(())
    }

    async fn quit(self: Box<Self>) -> NavigationResult<()> {
        self.state.lock().unwrap().quits += 1;
        Ok(())
    }
}
