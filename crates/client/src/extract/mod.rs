//! Candidate extraction from search result pages.
//!
//! ### Stable Abstraction
//! - The resolver only sees the [`CandidateExtractor`] trait: markup in,
//!   candidates out, in page order.
//! - [`SelectorExtractor`] is the CSS-selector implementation driven by a
//!   site's [`ListingSelectors`].
//!
//! ### Per-candidate tolerance
//! - A listing without a title is skipped.
//! - A missing or unparseable price or link leaves that field `None`; the
//!   candidate is still returned so it can be scored.
//! - Links are resolved against the page URL and canonicalized.

pub mod price;
pub mod specs;

pub use price::parse_price;
pub use specs::{MAX_SPECS_TEXT_CHARS, extract_spec_sheet};

use pricescout_core::{Candidate, Error};
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::fetch::url::resolve_href;
use specs::element_text;

/// Turns a search results page into candidates.
pub trait CandidateExtractor: Send + Sync {
    fn extract(&self, html: &str, base_url: &Url) -> Vec<Candidate>;
}

/// CSS selectors describing one site's listing cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingSelectors {
    /// One match per listing card.
    pub item: &'static str,
    /// Title element inside the card.
    pub title: &'static str,
    /// Price element inside the card.
    pub price: &'static str,
    /// Anchor inside the card whose `href` is the product URL.
    pub link: &'static str,
}

/// Selector-driven [`CandidateExtractor`].
#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    item: Selector,
    title: Selector,
    price: Selector,
    link: Selector,
}

impl SelectorExtractor {
    pub fn new(selectors: &ListingSelectors) -> Result<Self, Error> {
        Ok(Self {
            item: parse_selector(selectors.item)?,
            title: parse_selector(selectors.title)?,
            price: parse_selector(selectors.price)?,
            link: parse_selector(selectors.link)?,
        })
    }

    fn candidate(&self, card: ElementRef<'_>, base_url: &Url) -> Option<Candidate> {
        let title = card.select(&self.title).next().map(element_text)?;
        if title.is_empty() {
            return None;
        }

        let price = card.select(&self.price).next().and_then(|el| parse_price(&price_text(el)));
        let url = card
            .select(&self.link)
            .find_map(|a| a.value().attr("href"))
            .and_then(|href| resolve_href(base_url, href));

        Some(Candidate { title, price, url })
    }
}

impl CandidateExtractor for SelectorExtractor {
    fn extract(&self, html: &str, base_url: &Url) -> Vec<Candidate> {
        let document = Html::parse_document(html);
        let candidates: Vec<Candidate> = document
            .select(&self.item)
            .filter_map(|card| self.candidate(card, base_url))
            .collect();

        tracing::debug!(base = %base_url, count = candidates.len(), "extracted candidates");
        candidates
    }
}

fn parse_selector(css: &str) -> Result<Selector, Error> {
    Selector::parse(css).map_err(|e| Error::InvalidInput(format!("invalid selector {css:?}: {e}")))
}

/// Price element text with `<sup>` parts read as decimals (`1.299<sup>99</sup>`
/// becomes `1.299,99`).
fn price_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Node::Text(text) = node.value() else { continue };
        let in_sup = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name() == "sup"))
            .unwrap_or(false);
        if in_sup {
            out.push(',');
        }
        out.push_str(text);
    }
    out
}
