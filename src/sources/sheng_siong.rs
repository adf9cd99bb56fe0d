//! Sheng Siong adapter
//!
//! Single scrolling results page. The site is run in a minimized visible
//! browser by default because it serves headless clients an empty shell.

use super::page::{first_text, scrape_pages, selector};
use super::traits::{
    AdapterError, CardOutcome, CardSkip, ExtractionError, ListingRecord, ScrapeReport, Source,
    SourceAdapter, PRICE_UNAVAILABLE,
};
use crate::config::SiteConfig;
use crate::navigator::Navigator;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

const CARD: &str = "a.product-preview";
const NAME: &str = ".product-name";
const PRICE: &str = ".product-price span";

pub struct ShengSiongAdapter {
    site: SiteConfig,
}

impl ShengSiongAdapter {
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }
}

impl Default for ShengSiongAdapter {
    fn default() -> Self {
        Self::new(SiteConfig::defaults_for(Source::ShengSiong))
    }
}

fn parse_card(
    card: ElementRef<'_>,
    name_sel: &Selector,
    price_sel: &Selector,
) -> Result<ListingRecord, ExtractionError> {
    let name = first_text(card, name_sel).ok_or(ExtractionError::MissingName)?;
    if name.is_empty() {
        return Err(ExtractionError::EmptyName);
    }
    let price = first_text(card, price_sel)
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| PRICE_UNAVAILABLE.to_string());

    Ok(ListingRecord::new(Source::ShengSiong, name, price))
}

/// Extract every product card from one Sheng Siong results page.
pub(crate) fn parse_page(html: &str, page: u32) -> Result<Vec<CardOutcome>, AdapterError> {
    let card_sel = selector(CARD)?;
    let name_sel = selector(NAME)?;
    let price_sel = selector(PRICE)?;
    let doc = Html::parse_document(html);

    Ok(doc
        .select(&card_sel)
        .enumerate()
        .map(|(index, card)| {
            parse_card(card, &name_sel, &price_sel).map_err(|reason| CardSkip { page, index, reason })
        })
        .collect())
}

#[async_trait]
impl SourceAdapter for ShengSiongAdapter {
    fn source(&self) -> Source {
        Source::ShengSiong
    }

    async fn scrape(&self, term: &str, navigator: &Navigator) -> Result<ScrapeReport, AdapterError> {
        scrape_pages(navigator, &self.site, term, parse_page).await
    }
}
