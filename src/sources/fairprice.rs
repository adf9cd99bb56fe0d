//! FairPrice adapter
//!
//! Results are a single infinitely scrolling page. Prices have no stable
//! class, so the first `span` in the card whose text starts with `$` is
//! taken as the price.

use super::page::{element_text, first_text, scrape_pages, selector};
use super::traits::{
    AdapterError, CardOutcome, CardSkip, ExtractionError, ListingRecord, ScrapeReport, Source,
    SourceAdapter, PRICE_UNAVAILABLE,
};
use crate::config::SiteConfig;
use crate::navigator::Navigator;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

const CARD: &str = "[data-testid='product']";
const NAME: &str = "[data-testid='product-name-and-metadata'] span:last-child";
const SPAN: &str = "span";

pub struct FairPriceAdapter {
    site: SiteConfig,
}

impl FairPriceAdapter {
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }
}

impl Default for FairPriceAdapter {
    fn default() -> Self {
        Self::new(SiteConfig::defaults_for(Source::FairPrice))
    }
}

struct Selectors {
    card: Selector,
    name: Selector,
    span: Selector,
}

fn parse_card(card: ElementRef<'_>, sel: &Selectors) -> Result<ListingRecord, ExtractionError> {
    let name = first_text(card, &sel.name).ok_or(ExtractionError::MissingName)?;
    if name.is_empty() {
        return Err(ExtractionError::EmptyName);
    }

    let price = card
        .select(&sel.span)
        .map(element_text)
        .find(|text| text.starts_with('$'))
        .unwrap_or_else(|| PRICE_UNAVAILABLE.to_string());

    Ok(ListingRecord::new(Source::FairPrice, name, price))
}

/// Extract every product card from one FairPrice results page.
pub(crate) fn parse_page(html: &str, page: u32) -> Result<Vec<CardOutcome>, AdapterError> {
    let sel = Selectors {
        card: selector(CARD)?,
        name: selector(NAME)?,
        span: selector(SPAN)?,
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
impl SourceAdapter for FairPriceAdapter {
    fn source(&self) -> Source {
        Source::FairPrice
    }

    async fn scrape(&self, term: &str, navigator: &Navigator) -> Result<ScrapeReport, AdapterError> {
        scrape_pages(navigator, &self.site, term, parse_page).await
    }
}
