//! Shared page walking and HTML helpers for the retailer adapters
//!
//! Adapters describe how one results page turns into card outcomes; this
//! module drives the session around that: open, scroll, read, paginate,
//! and always close.

use super::traits::{AdapterError, CardOutcome, ScrapeReport};
use crate::config::SiteConfig;
use crate::navigator::{Navigator, Session};
use scraper::{ElementRef, Selector};
use tracing::{debug, warn};

/// Compile a CSS selector, reporting failures as adapter errors.
pub(crate) fn selector(css: &str) -> Result<Selector, AdapterError> {
    Selector::parse(css).map_err(|e| AdapterError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Visible-ish text of an element with whitespace runs collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first descendant matching `sel`, if there is one.
pub(crate) fn first_text(card: ElementRef<'_>, sel: &Selector) -> Option<String> {
    card.select(sel).next().map(element_text)
}

/// Walk a site's result pages for `term` and collect every card.
///
/// `parse_page` turns one page of HTML into card outcomes for the given
/// page number. Pagination stops at `site.max_pages` or at the first page
/// without cards. A failure on the first page fails the whole search; a
/// failure on a later page keeps what was already collected.
pub(crate) async fn scrape_pages<F>(
    navigator: &Navigator,
    site: &SiteConfig,
    term: &str,
    parse_page: F,
) -> Result<ScrapeReport, AdapterError>
where
    F: Fn(&str, u32) -> Result<Vec<CardOutcome>, AdapterError> + Send + Sync,
{
    let first_url = site.search_url_for(term, 1);
    let mut session = navigator.open(&first_url, site.browser).await?;

    let result = walk_pages(&mut session, site, term, &parse_page).await;
    session.close().await;

    let report = result?;
    if !report.skipped.is_empty() {
        warn!(
            source = %site.source,
            term,
            skipped = report.skipped.len(),
            kept = report.records.len(),
            "some product cards could not be read"
        );
    }
    Ok(report)
}

async fn walk_pages<F>(
    session: &mut Session,
    site: &SiteConfig,
    term: &str,
    parse_page: &F,
) -> Result<ScrapeReport, AdapterError>
where
    F: Fn(&str, u32) -> Result<Vec<CardOutcome>, AdapterError> + Send + Sync,
{
    let mut report = ScrapeReport::new(site.source);

    for page in 1..=site.max_pages {
        if page > 1 {
            let url = site.search_url_for(term, page);
            if let Err(e) = session.goto(&url).await {
                warn!(source = %site.source, term, page, error = %e, "stopping pagination early");
                break;
            }
        }

        let scrolled = match session
            .scroll_to_load(site.scroll_pause, site.max_scroll_attempts)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) if page > 1 => {
                warn!(source = %site.source, term, page, error = %e, "stopping pagination early");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        let html = match session.page_source().await {
            Ok(html) => html,
            Err(e) if page > 1 => {
                warn!(source = %site.source, term, page, error = %e, "stopping pagination early");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        let outcomes = parse_page(&html, page)?;
        debug!(
            source = %site.source,
            term,
            page,
            cards = outcomes.len(),
            scrolls = scrolled.attempts,
            "read results page"
        );

        report.pages_visited += 1;
        if outcomes.is_empty() {
            // Either no results at all or we ran past the last page
            break;
        }
        for skip in outcomes.iter().filter_map(|o| o.as_ref().err()) {
            debug!(source = %site.source, page, card = skip.index, reason = %skip.reason, "skipped card");
        }
        report.absorb(outcomes);
    }

    Ok(report)
}
