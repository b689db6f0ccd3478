//! Spec sheet extraction from product detail pages.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use pricescout_core::SpecSheet;
use scraper::{ElementRef, Html, Selector};

/// Longest `specs_text` kept, in characters.
pub const MAX_SPECS_TEXT_CHARS: usize = 5000;

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1.page-title").expect("invalid selector"));
static BLOCKS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#tab-specs, div#product-specs, div.specs, div#specificatii").expect("invalid selector")
});
static ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table tr").expect("invalid selector"));
static ROW_KEY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td:nth-child(1)").expect("invalid selector"));
static ROW_VALUE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td:nth-child(2)").expect("invalid selector"));

/// Pull the title, free-text spec blocks and key/value table rows from a
/// product page. Parts that are missing are left empty.
pub fn extract_spec_sheet(html: &str) -> SpecSheet {
    let document = Html::parse_document(html);

    let title = document.select(&TITLE).next().map(element_text).filter(|t| !t.is_empty());

    let joined = document
        .select(&BLOCKS)
        .map(block_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let specs_text = (!joined.is_empty()).then(|| joined.chars().take(MAX_SPECS_TEXT_CHARS).collect());

    let mut attributes = BTreeMap::new();
    for row in document.select(&ROWS) {
        let key = row.select(&ROW_KEY).next().map(element_text).unwrap_or_default();
        let value = row.select(&ROW_VALUE).next().map(element_text).unwrap_or_default();
        if !key.is_empty() && !value.is_empty() {
            attributes.insert(key, value);
        }
    }

    SpecSheet { title, specs_text, attributes }
}

/// Element text with whitespace runs collapsed to single spaces.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// Block text keeping line structure: each non-blank line trimmed.
fn block_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
