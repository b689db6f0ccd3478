//! Per-host pacing, settle pauses and soft-block retries.
//!
//! ### Pacing
//! - Requests to the same network location (`host[:port]`) are spaced by a
//!   delay drawn uniformly from [`FetchPolicy::delay_range`], measured from the
//!   end of the previous call for that host.
//! - Each host has its own slot. The slot is held for the whole call, so calls
//!   to one host are serialized while other hosts proceed.
//! - The slot's timestamp is written once per call, on success or failure.
//!
//! ### Retries
//! - Every navigation is followed by a settle pause.
//! - A page carrying a soft-block marker is retried up to `max_retries` times,
//!   with a growing backoff plus jitter between attempts.
//! - Navigation errors are returned immediately.
//!
//! All waiting goes through `tokio::time`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use url::Url;

use pricescout_core::{AppConfig, Error};

use super::PageClient;
use super::block::is_soft_blocked;
use super::url::host_key;

type Slot = Arc<Mutex<Option<Instant>>>;

/// Last-hit timestamps per network location.
///
/// Owned by whoever builds the fetchers and shared through `Arc`, so tests
/// and separate workflows never see each other's timestamps.
#[derive(Debug, Default)]
pub struct HostThrottle {
    slots: Mutex<HashMap<String, Slot>>,
}

impl HostThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, host: &str) -> Slot {
        let mut slots = self.slots.lock().await;
        slots.entry(host.to_string()).or_default().clone()
    }

    /// When `host` was last released, if ever.
    pub async fn last_hit(&self, host: &str) -> Option<Instant> {
        let slot = self.slot(host).await;
        let last = *slot.lock().await;
        last
    }
}

/// Timing and retry parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    /// Minimum spacing between calls to one host, sampled per call.
    pub delay_range: (Duration, Duration),
    /// Pause after every navigation before the page is inspected.
    pub settle_range: (Duration, Duration),
    /// Extra navigations allowed while the page stays soft-blocked.
    pub max_retries: u32,
    /// Backoff before retry `n` (1-based) is `n × backoff_step + jitter`.
    pub backoff_step: Duration,
    /// Upper bound of the uniform jitter added to each backoff.
    pub backoff_jitter: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::polite()
    }
}

impl FetchPolicy {
    /// Default interactive profile: 2–5 s between requests to one host.
    pub fn polite() -> Self {
        Self {
            delay_range: (Duration::from_millis(2000), Duration::from_millis(5000)),
            settle_range: (Duration::from_millis(500), Duration::from_millis(1200)),
            max_retries: 2,
            backoff_step: Duration::from_millis(2500),
            backoff_jitter: Duration::from_secs(1),
        }
    }

    /// Faster profile for bulk crawls: 0.2–0.6 s between requests.
    pub fn bulk() -> Self {
        Self { delay_range: (Duration::from_millis(200), Duration::from_millis(600)), ..Self::polite() }
    }

    /// Polite profile with the configured delay range and retry cap.
    pub fn from_config(config: &AppConfig) -> Self {
        Self { delay_range: config.delay_range(), max_retries: config.max_retries, ..Self::polite() }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt + sample(Duration::ZERO, self.backoff_jitter)
    }
}

/// What happened during one [`ThrottledFetcher::fetch`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Navigations performed, at least 1.
    pub attempts: u32,
    /// Whether the final page still carried a soft-block marker.
    pub blocked: bool,
}

/// Drives a [`PageClient`] with per-host pacing and soft-block retries.
#[derive(Debug, Clone)]
pub struct ThrottledFetcher {
    throttle: Arc<HostThrottle>,
    policy: FetchPolicy,
}

impl ThrottledFetcher {
    pub fn new(throttle: Arc<HostThrottle>, policy: FetchPolicy) -> Self {
        Self { throttle, policy }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Navigate `client` to `url` once the host's pacing delay has elapsed.
    ///
    /// On return the client holds the last page loaded. A page that is still
    /// soft-blocked after all retries is returned as `Ok` with `blocked` set.
    pub async fn fetch<C>(&self, client: &mut C, url: &Url) -> Result<FetchOutcome, Error>
    where
        C: PageClient + ?Sized,
    {
        let host = host_key(url);
        let slot = self.throttle.slot(&host).await;
        let mut last_hit = slot.lock().await;

        let delay = sample(self.policy.delay_range.0, self.policy.delay_range.1);
        if let Some(prev) = *last_hit {
            let elapsed = prev.elapsed();
            if elapsed < delay {
                tracing::debug!(host = %host, wait_ms = (delay - elapsed).as_millis() as u64, "pacing request");
                sleep(delay - elapsed).await;
            }
        }

        let result = self.navigate_until_clear(client, url).await;
        *last_hit = Some(Instant::now());
        result
    }

    async fn navigate_until_clear<C>(&self, client: &mut C, url: &Url) -> Result<FetchOutcome, Error>
    where
        C: PageClient + ?Sized,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            client.navigate(url).await?;
            sleep(sample(self.policy.settle_range.0, self.policy.settle_range.1)).await;

            if !is_soft_blocked(client.page_source()) {
                tracing::debug!(url = %url, attempts, "page loaded");
                return Ok(FetchOutcome { attempts, blocked: false });
            }

            if attempts > self.policy.max_retries {
                tracing::warn!(url = %url, attempts, "page still soft-blocked, giving up");
                return Ok(FetchOutcome { attempts, blocked: true });
            }

            let backoff = self.policy.backoff(attempts);
            tracing::warn!(
                url = %url,
                attempt = attempts,
                backoff_ms = backoff.as_millis() as u64,
                "soft block detected"
            );
            sleep(backoff).await;
        }
    }
}

/// Uniform sample from `[lo, hi]`; `lo` when the range is empty or inverted.
fn sample(lo: Duration, hi: Duration) -> Duration {
    if hi <= lo {
        return lo;
    }
    rand::thread_rng().gen_range(lo..=hi)
}
