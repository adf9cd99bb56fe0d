//! Scripted browser backend for integration tests

use async_trait::async_trait;
use pricewatch::navigator::{BrowserLauncher, BrowserMode, NavigationError, NavigationResult, PageSession};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Script {
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    visited: Vec<String>,
    launches: usize,
    quits: usize,
    minimized: usize,
    open_now: usize,
    open_peak: usize,
}

/// Serves canned HTML by URL and counts browser lifecycles.
///
/// Unknown URLs load as an empty document. Page height never changes, so
/// each scroll pass settles after one attempt.
#[derive(Clone, Default)]
pub struct ScriptedBrowser {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, html: String) -> Self {
        self.script.lock().unwrap().pages.insert(url.to_string(), html);
        self
    }

    pub fn failing(self, url: &str) -> Self {
        self.script.lock().unwrap().failing.insert(url.to_string());
        self
    }

    pub fn hanging(self, url: &str) -> Self {
        self.script.lock().unwrap().hanging.insert(url.to_string());
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.script.lock().unwrap().visited.clone()
    }

    pub fn launches(&self) -> usize {
        self.script.lock().unwrap().launches
    }

    pub fn quits(&self) -> usize {
        self.script.lock().unwrap().quits
    }

    pub fn minimized(&self) -> usize {
        self.script.lock().unwrap().minimized
    }

    /// Most browsers that were ever alive at the same time
    pub fn open_peak(&self) -> usize {
        self.script.lock().unwrap().open_peak
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedBrowser {
    async fn launch(&self, _mode: BrowserMode) -> NavigationResult<Box<dyn PageSession>> {
        let mut script = self.script.lock().unwrap();
        script.launches += 1;
        script.open_now += 1;
        script.open_peak = script.open_peak.max(script.open_now);
        Ok(Box::new(ScriptedPage {
            script: self.script.clone(),
            current: None,
        }))
    }
}

struct ScriptedPage {
    script: Arc<Mutex<Script>>,
    current: Option<String>,
}

#[async_trait]
impl PageSession for ScriptedPage {
    async fn goto(&mut self, url: &str) -> NavigationResult<()> {
        let (fails, hangs) = {
            let mut script = self.script.lock().unwrap();
            script.visited.push(url.to_string());
            (script.failing.contains(url), script.hanging.contains(url))
        };
        if hangs {
            std::future::pending::<()>().await;
        }
        if fails {
            return Err(NavigationError::Load {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn scroll_height(&mut self) -> NavigationResult<u64> {
        Ok(2400)
    }

    async fn scroll_to_bottom(&mut self) -> NavigationResult<()> {
        Ok(())
    }

    async fn page_source(&mut self) -> NavigationResult<String> {
        let script = self.script.lock().unwrap();
        Ok(self
            .current
            .as_ref()
            .and_then(|url| script.pages.get(url).cloned())
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn minimize(&mut self) -> NavigationResult<()> {
        self.script.lock().unwrap().minimized += 1;
        Ok(())
    }

    async fn quit(self: Box<Self>) -> NavigationResult<()> {
        let mut script = self.script.lock().unwrap();
        script.quits += 1;
        script.open_now -= 1;
        Ok(())
    }
}
