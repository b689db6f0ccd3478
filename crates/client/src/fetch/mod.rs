//! Page loading for catalog sites.
//!
//! ### Page clients
//! - [`PageClient`] is the navigation seam: load a URL, then read the page
//!   source. The workflow never builds one itself; callers inject it.
//! - [`HttpPageClient`] is the reqwest implementation with a fixed page-load
//!   ceiling, cookie store, proxy support and a rotated User-Agent.
//!
//! ### Politeness
//! - [`ThrottledFetcher`] paces requests per host, pauses after each load
//!   and retries soft-blocked pages (see [`throttle`]).
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string

pub mod agent;
pub mod block;
pub mod throttle;
pub mod url;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};

pub use agent::random_user_agent;
pub use block::{SOFT_BLOCK_MARKERS, is_soft_blocked};
pub use throttle::{FetchOutcome, FetchPolicy, HostThrottle, ThrottledFetcher};
pub use self::url::{SpaceStyle, UrlError, canonicalize, host_key};

use pricescout_core::{AppConfig, Error};

/// A browser-like session that holds one page at a time.
#[async_trait]
pub trait PageClient: Send {
    /// Load `url`, replacing the current page.
    async fn navigate(&mut self, url: &::url::Url) -> Result<(), Error>;

    /// Markup of the current page; empty before the first navigation.
    fn page_source(&self) -> &str;

    /// Final URL of the current page after redirects.
    fn current_url(&self) -> Option<&::url::Url>;
}

/// Configuration for the HTTP page client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Fixed User-Agent; a random browser string is used when unset.
    pub user_agent: Option<String>,

    /// Page-load ceiling (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 10)
    pub max_redirects: usize,

    /// Maximum body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Proxy for all requests
    pub proxy_url: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout: Duration::from_millis(20000),
            max_redirects: 10,
            max_bytes: 5 * 1024 * 1024,
            proxy_url: None,
        }
    }
}

impl From<&AppConfig> for HttpConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            max_bytes: config.max_bytes,
            proxy_url: config.proxy_url.clone(),
            ..Default::default()
        }
    }
}

/// reqwest-backed [`PageClient`].
///
/// `429` and `503` responses are kept as page content so the fetcher can see
/// the block page; any other non-success status is an error. Bodies larger
/// than `max_bytes` are rejected with `FETCH_TOO_LARGE`.
#[derive(Debug)]
pub struct HttpPageClient {
    http: Client,
    user_agent: String,
    max_bytes: usize,
    source: String,
    current: Option<::url::Url>,
}

impl HttpPageClient {
    /// Build a client. The User-Agent is fixed for the client's lifetime.
    pub fn new(config: &HttpConfig) -> Result<Self, Error> {
        let user_agent = match config.user_agent {
            Some(ref custom) => custom.clone(),
            None => random_user_agent().to_string(),
        };

        let mut builder = Client::builder()
            .user_agent(&user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .cookie_store(true)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);

        if let Some(proxy) = config.proxy_url.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| Error::InvalidUrl(format!("proxy {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, user_agent, max_bytes: config.max_bytes, source: String::new(), current: None })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[async_trait]
impl PageClient for HttpPageClient {
    async fn navigate(&mut self, url: &::url::Url) -> Result<(), Error> {
        let start = Instant::now();

        let mut response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(header::ACCEPT_LANGUAGE, "ro-RO,ro;q=0.9,en-US;q=0.8,en;q=0.7")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::FetchTimeout(format!("{url}: {e}"))
                } else {
                    Error::HttpError(format!("network error: {e}"))
                }
            })?;

        let status = response.status();
        let soft_status = matches!(status, StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE);
        if !status.is_success() && !soft_status {
            return Err(Error::HttpError(format!("status {} for {url}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{len} bytes exceeds {}", self.max_bytes)));
        }

        let final_url = response.url().clone();
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{url}: {e}"))
            } else {
                Error::HttpError(format!("failed to read response: {e}"))
            }
        })? {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(Error::FetchTooLarge(format!("body of {url} exceeds {} bytes", self.max_bytes)));
            }
            bytes.extend_from_slice(&chunk);
        }
        let body = String::from_utf8_lossy(&bytes).into_owned();

        tracing::debug!(
            "loaded {} -> {} ({}) in {}ms ({} bytes)",
            url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        self.source = body;
        self.current = Some(final_url);
        Ok(())
    }

    fn page_source(&self) -> &str {
        &self.source
    }

    fn current_url(&self) -> Option<&::url::Url> {
        self.current.as_ref()
    }
}
