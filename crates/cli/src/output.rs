//! Human and JSON renderings of results.

use pricescout_core::ResolvedEntry;
use serde::Serialize;

/// One site's answer, as printed with `--json`.
#[derive(Debug, Serialize)]
pub struct SiteResult<'a> {
    pub site: &'a str,
    pub result: Option<ResolvedEntry>,
}

/// `title - price Lei` followed by the URL on its own line.
pub fn format_entry(entry: &ResolvedEntry) -> String {
    let title = entry.title.as_deref().unwrap_or("(untitled)");
    let price = entry.price.map(|p| format!("{p:.2}")).unwrap_or_else(|| "?".into());
    let url = entry.url.as_deref().unwrap_or("-");
    format!("{title} - {price} Lei\n{url}")
}

pub fn format_site_result(label: &str, entry: Option<&ResolvedEntry>) -> String {
    match entry {
        Some(entry) => format!("Best result on {label}:\n{}", format_entry(entry)),
        None => format!("No matching products on {label}."),
    }
}
