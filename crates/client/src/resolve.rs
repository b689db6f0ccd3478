//! Query resolution: cache first, then one throttled search page.
//!
//! 1. Exact lookup in the query index. A hit returns without touching the
//!    network.
//! 2. On a miss, fetch the site's search page through the throttled fetcher
//!    and extract candidates in page order.
//! 3. Pick the winner: strictly highest score at or above
//!    [`RELEVANCE_FLOOR`] among eligible candidates, stopping early at
//!    [`CONFIDENT_MATCH`] or past the site's scan cap.
//! 4. Optionally enrich the winner from its product page, then record it
//!    under the query and return it.
//!
//! Cache failures are logged and treated as a miss or a skipped write.

use chrono::Utc;
use pricescout_core::scoring::{CONFIDENT_MATCH, RELEVANCE_FLOOR};
use pricescout_core::{CacheStore, Candidate, EntryPatch, Error, ResolvedEntry, Scorer, Specs};
use url::Url;

use crate::extract::{CandidateExtractor, extract_spec_sheet};
use crate::fetch::{PageClient, ThrottledFetcher};
use crate::sites::SiteProfile;

/// Winning candidate and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct Pick<'a> {
    pub candidate: &'a Candidate,
    pub score: f64,
}

/// Select the best candidate for `query`.
///
/// Candidates are visited in order. Ties keep the earlier candidate. With a
/// `scan_cap`, scanning stops after the first relevant candidate past the cap
/// once a winner exists; that candidate still competes.
pub fn pick_winner<'a, S>(
    candidates: &'a [Candidate],
    query: &str,
    scorer: &S,
    scan_cap: Option<usize>,
) -> Option<Pick<'a>>
where
    S: Scorer + ?Sized,
{
    let mut best: Option<Pick<'a>> = None;

    for (idx, candidate) in candidates.iter().enumerate() {
        let score = scorer.score(&candidate.title, query);
        if score < RELEVANCE_FLOOR {
            continue;
        }

        if candidate.is_eligible() && best.as_ref().is_none_or(|b| score > b.score) {
            tracing::debug!(title = %candidate.title, score, "new best candidate");
            best = Some(Pick { candidate, score });
            if score >= CONFIDENT_MATCH {
                break;
            }
        }

        if let Some(cap) = scan_cap
            && idx > cap
            && best.is_some()
        {
            tracing::debug!(idx, cap, "scan cap reached");
            break;
        }
    }

    best
}

/// Resolves queries against site profiles, backed by the result cache.
#[derive(Debug, Clone)]
pub struct Resolver {
    cache: CacheStore,
    fetcher: ThrottledFetcher,
}

impl Resolver {
    pub fn new(cache: CacheStore, fetcher: ThrottledFetcher) -> Self {
        Self { cache, fetcher }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Best listing for `query` on `site`, or `None` when nothing qualifies
    /// or the site could not be reached.
    pub async fn resolve<C>(&self, site: &SiteProfile, query: &str, client: &mut C) -> Option<ResolvedEntry>
    where
        C: PageClient + ?Sized,
    {
        match self.try_resolve(site, query, client).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(site = site.name, query, error = %e, "resolution failed");
                None
            }
        }
    }

    /// Like [`Resolver::resolve`], but reports navigation and input errors.
    pub async fn try_resolve<C>(
        &self,
        site: &SiteProfile,
        query: &str,
        client: &mut C,
    ) -> Result<Option<ResolvedEntry>, Error>
    where
        C: PageClient + ?Sized,
    {
        if let Some(hit) = self.cached(site, query).await {
            tracing::info!(site = site.name, query, "cache hit");
            return Ok(Some(hit));
        }

        let search_url = site.search_url(query)?;
        let outcome = self.fetcher.fetch(client, &search_url).await?;
        if outcome.blocked {
            tracing::warn!(site = site.name, attempts = outcome.attempts, "scanning a soft-blocked page");
        }

        let base = client.current_url().cloned().unwrap_or(search_url);
        let candidates = site.extractor()?.extract(client.page_source(), &base);

        let Some(pick) = pick_winner(&candidates, query, &site.scorer, site.scan_cap) else {
            tracing::info!(site = site.name, query, scanned = candidates.len(), "no match");
            return Ok(None);
        };
        tracing::info!(site = site.name, query, title = %pick.candidate.title, score = pick.score, "resolved");

        let mut patch = EntryPatch::from(pick.candidate.clone());
        if site.spec_page
            && let Some(url) = patch.url.as_deref()
        {
            patch.specs = self.fetch_specs(client, url).await;
        }

        let entry = patch.clone().into_entry(Utc::now());
        if let Err(e) = self.cache.upsert_for_query(site.name, query, patch).await {
            tracing::warn!(site = site.name, query, error = %e, "failed to cache resolution");
        }

        Ok(Some(entry))
    }

    async fn cached(&self, site: &SiteProfile, query: &str) -> Option<ResolvedEntry> {
        match self.cache.get_for_query(site.name, query).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(site = site.name, error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn fetch_specs<C>(&self, client: &mut C, product_url: &str) -> Option<Specs>
    where
        C: PageClient + ?Sized,
    {
        let url = match Url::parse(product_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(url = product_url, error = %e, "skipping spec page");
                return None;
            }
        };

        if let Err(e) = self.fetcher.fetch(client, &url).await {
            tracing::warn!(url = product_url, error = %e, "spec page fetch failed");
            return None;
        }

        let sheet = extract_spec_sheet(client.page_source());
        (!sheet.is_empty()).then_some(Specs::Sheet(sheet))
    }
}
