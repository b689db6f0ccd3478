//! URL canonicalization, throttle keys and search query encoding.

use url::form_urlencoded;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for pricescout_core::Error {
    fn from(err: UrlError) -> Self {
        pricescout_core::Error::InvalidUrl(err.to_string())
    }
}

/// Canonicalize a URL string before it is fetched or cached.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve a scraped `href` against the page it came from.
///
/// Returns `None` for empty, unparseable or non-HTTP links.
pub fn resolve_href(base: &url::Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let joined = base.join(href).ok()?;
    canonicalize(joined.as_str()).ok().map(String::from)
}

/// Network location used to pace requests: `host` or `host:port`.
pub fn host_key(url: &url::Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    }
}

/// How a site expects spaces in the search term to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceStyle {
    /// `%20`, for terms placed in a path segment or a strict query.
    Percent,
    /// `+`, form encoding.
    Plus,
}

/// Percent-encode a search term. Surrounding whitespace is dropped.
pub fn encode_query(query: &str, style: SpaceStyle) -> String {
    let encoded: String = form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();
    match style {
        SpaceStyle::Plus => encoded,
        SpaceStyle::Percent => encoded.replace('+', "%20"),
    }
}
