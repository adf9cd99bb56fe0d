//! Cold Storage adapter
//!
//! Results are paginated. Prices are split into a major part (`.price`,
//! e.g. `$5`) and an optional minor part (`.small-price`, e.g. `.95`)
//! which are joined back into one display string.

use super::page::{first_text, scrape_pages, selector};
use super::traits::{
    AdapterError, CardOutcome, CardSkip, ExtractionError, ListingRecord, ScrapeReport, Source,
    SourceAdapter, PRICE_UNAVAILABLE,
};
use crate::config::SiteConfig;
use crate::navigator::Navigator;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

const CARD: &str = "a.ware-wrapper";
const NAME: &str = ".name";
const PRICE_MAJOR: &str = ".price";
const PRICE_MINOR: &str = ".small-price";

pub struct ColdStorageAdapter {
    site: SiteConfig,
}

impl ColdStorageAdapter {
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }
}

impl Default for ColdStorageAdapter {
    fn default() -> Self {
        Self::new(SiteConfig::defaults_for(Source::ColdStorage))
    }
}

struct Selectors {
    card: Selector,
    name: Selector,
    major: Selector,
    minor: Selector,
}

fn parse_card(card: ElementRef<'_>, sel: &Selectors) -> Result<ListingRecord, ExtractionError> {
    let name = first_text(card, &sel.name).ok_or(ExtractionError::MissingName)?;
    if name.is_empty() {
        return Err(ExtractionError::EmptyName);
    }

    let price = match first_text(card, &sel.major).filter(|p| !p.is_empty()) {
        Some(major) => {
            let minor = first_text(card, &sel.minor).unwrap_or_default();
            format!("{}{}", major, minor)
        }
        None => PRICE_UNAVAILABLE.to_string(),
    };

    Ok(ListingRecord::new(Source::ColdStorage, name, price))
}

/// Extract every product card from one Cold Storage results page.
pub(crate) fn parse_page(html: &str, page: u32) -> Result<Vec<CardOutcome>, AdapterError> {
    let sel = Selectors {
        card: selector(CARD)?,
        name: selector(NAME)?,
        major: selector(PRICE_MAJOR)?,
        minor: selector(PRICE_MINOR)?,
    };
    let doc = Html::parse_document(html);

    Ok(doc
        .select(&sel.card)
        .enumerate()
        .map(|(index, card)| {
            parse_card(card, &sel).map_err(|reason| CardSkip { page, index, reason })
        })
        .collect())
}

#[async_trait]
impl SourceAdapter for ColdStorageAdapter {
    fn source(&self) -> Source {
        Source::ColdStorage
    }

    async fn scrape(&self, term: &str, navigator: &Navigator) -> Result<ScrapeReport, AdapterError> {
        scrape_pages(navigator, &self.site, term, parse_page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::fake::FakeBrowser;
    use std::sync::Arc;
    use std::time::Duration;

    fn card(name: &str, major: Option<&str>, minor: Option<&str>) -> String {
        let major = major
            .map(|p| format!(r#"<span class="price">{}</span>"#, p))
            .unwrap_or_default();
        let minor = minor
            .map(|p| format!(r#"<span class="small-price">{}</span>"#, p))
            .unwrap_or_default();
        format!(
            r#"<a class="ware-wrapper" href="/p/1"><div class="name">{}</div><div>{}{}</div></a>"#,
            name, major, minor
        )
    }

    fn page(cards: &[String]) -> String {
        format!("<html><body>{}</body></html>", cards.join(""))
    }

    fn url(page: u32) -> String {
        format!("https://coldstorage.com.sg/en/search?keyword=Eggs 12pk&page={}", page)
    }

    fn fast_site() -> SiteConfig {
        let mut site = SiteConfig::defaults_for(Source::ColdStorage);
        site.scroll_pause = Duration::ZERO;
        site
    }

    #[test]
    fn joins_split_price() {
        let html = page(&[card("Pasar Eggs 10s", Some("$4"), Some(".95"))]);
        let outcomes = parse_page(&html, 1).unwrap();
        assert_eq!(outcomes[0].as_ref().unwrap().price, "$4.95");
    }

    #[test]
    fn major_price_alone_is_kept() {
        let html = page(&[card("Pasar Eggs 10s", Some("$1,004"), None)]);
        let outcomes = parse_page(&html, 1).unwrap();
        assert_eq!(outcomes[0].as_ref().unwrap().price, "$1,004");
    }

    #[test]
    fn missing_major_price_becomes_sentinel() {
        let html = page(&[card("Pasar Eggs 10s", None, Some(".95"))]);
        let outcomes = parse_page(&html, 1).unwrap();
        assert_eq!(outcomes[0].as_ref().unwrap().price, PRICE_UNAVAILABLE);
    }

    #[test]
    fn empty_name_is_skipped() {
        let html = page(&[card("   ", Some("$4"), None), card("Real", Some("$1"), None)]);
        let outcomes = parse_page(&html, 2).unwrap();
        assert_eq!(
            outcomes[0],
            Err(CardSkip {
                page: 2,
                index: 0,
                reason: ExtractionError::EmptyName
            })
        );
        assert!(outcomes[1].is_ok());
    }

    #[tokio::test]
    async fn walks_pages_until_one_is_empty() {
        let browser = FakeBrowser::new()
            .with_page(&url(1), &page(&[card("A", Some("$1"), None), card("B", Some("$2"), None)]))
            .with_page(&url(2), &page(&[card("C", Some("$3"), None)]))
            .with_page(&url(3), &page(&[]));
        let navigator = Navigator::new(Arc::new(browser.clone()));

        let mut site = fast_site();
        site.max_pages = 5;
        let report = ColdStorageAdapter::new(site)
            .scrape("Eggs 12pk", &navigator)
            .await
            .unwrap();

        let names: Vec<_> = report.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(browser.visited(), vec![url(1), url(2), url(3)]);
        assert_eq!(report.pages_visited, 3);
        assert_eq!(browser.launches(), 1);
        assert_eq!(browser.quits(), 1);
    }

    #[tokio::test]
    async fn stops_at_page_cap() {
        let browser = FakeBrowser::new()
            .with_page(&url(1), &page(&[card("A", Some("$1"), None)]))
            .with_page(&url(2), &page(&[card("B", Some("$2"), None)]))
            .with_page(&url(3), &page(&[card("C", Some("$3"), None)]))
            .with_page(&url(4), &page(&[card("D", Some("$4"), None)]));
        let navigator = Navigator::new(Arc::new(browser.clone()));

        let report = ColdStorageAdapter::new(fast_site())
            .scrape("Eggs 12pk", &navigator)
            .await
            .unwrap();

        assert_eq!(report.records.len(), 3);
        assert_eq!(browser.visited().len(), 3);
    }

    #[tokio::test]
    async fn later_page_failure_keeps_earlier_pages() {
        let browser = FakeBrowser::new()
            .with_page(&url(1), &page(&[card("A", Some("$1"), None)]))
            .failing(&url(2));
        let navigator = Navigator::new(Arc::new(browser.clone()));

        let report = ColdStorageAdapter::new(fast_site())
            .scrape("Eggs 12pk", &navigator)
            .await
            .unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(browser.quits(), 1);
    }

    #[tokio::test]
    async fn first_page_failure_is_an_error() {
        let browser = FakeBrowser::new().failing(&url(1));
        let navigator = Navigator::new(Arc::new(browser.clone()));

        let result = ColdStorageAdapter::new(fast_site())
            .scrape("Eggs 12pk", &navigator)
            .await;

        assert!(matches!(result, Err(AdapterError::Navigation(_))));
        assert_eq!(browser.quits(), 1);
    }
}
