//! JSON-file result cache with exact-query and fuzzy lookup paths.
//!
//! Every operation reloads the whole document from disk, and every mutation
//! rewrites it atomically. There is no long-lived in-memory copy.
//!
//! - `get_for_query` follows the query index (normalized query → URL) back to
//!   the entry with that URL.
//! - `find_best` scans a site's entries with a caller-supplied scorer and only
//!   answers at or above [`CACHE_MATCH_FLOOR`].
//!
//! Mutations from one `CacheStore` (and its clones) are serialized. Separate
//! processes sharing a file are last-write-wins.

pub mod file;
pub mod key;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

pub use file::{PersistedStore, QueryIndex};
pub use key::normalize_query;

use crate::Error;
use crate::model::{EntryPatch, ResolvedEntry};
use crate::scoring::{CACHE_MATCH_FLOOR, Scorer};

/// Handle to the cache file.
#[derive(Clone, Debug)]
pub struct CacheStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl CacheStore {
    /// Create a handle for `path`. Nothing is touched until the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Arc::new(Mutex::new(())) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries cached for `site`; empty when the site or file is absent.
    pub async fn load(&self, site: &str) -> Result<Vec<ResolvedEntry>, Error> {
        let store = file::read(&self.path).await?;
        Ok(store.entries(site).to_vec())
    }

    /// Site names present in the cache.
    pub async fn sites(&self) -> Result<Vec<String>, Error> {
        let store = file::read(&self.path).await?;
        Ok(store.items.keys().cloned().collect())
    }

    /// Merge `patch` into the site's entries (by URL, then title) or append it.
    pub async fn upsert(&self, site: &str, patch: EntryPatch) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        let mut store = file::read(&self.path).await?;
        store.upsert(site, patch, Utc::now());
        file::write(&self.path, &store).await
    }

    /// Upsert and, when the patch carries a URL, index `query` to it.
    ///
    /// Both changes land in a single rewrite of the file.
    pub async fn upsert_for_query(&self, site: &str, query: &str, patch: EntryPatch) -> Result<(), Error> {
        let url = patch.url_key().to_string();

        let _guard = self.write_lock.lock().await;
        let mut store = file::read(&self.path).await?;
        store.upsert(site, patch, Utc::now());
        if !url.is_empty() {
            store.index_query(site, query, &url);
        }
        file::write(&self.path, &store).await?;

        tracing::debug!(site, query = %normalize_query(query), url = %url, "cached resolution");
        Ok(())
    }

    /// Exact lookup through the query index.
    pub async fn get_for_query(&self, site: &str, query: &str) -> Result<Option<ResolvedEntry>, Error> {
        let store = file::read(&self.path).await?;
        Ok(store.get_for_query(site, query).cloned())
    }

    /// Highest-scoring entry by title, if it reaches [`CACHE_MATCH_FLOOR`].
    pub async fn find_best<S>(&self, site: &str, query: &str, scorer: &S) -> Result<Option<ResolvedEntry>, Error>
    where
        S: Scorer + ?Sized,
    {
        let store = file::read(&self.path).await?;
        let query = query.trim();

        let mut best: Option<&ResolvedEntry> = None;
        let mut best_score = 0.0;
        for entry in store.entries(site) {
            let score = scorer.score(entry.title.as_deref().unwrap_or_default(), query);
            if score > best_score {
                best = Some(entry);
                best_score = score;
            }
        }

        Ok(best.filter(|_| best_score >= CACHE_MATCH_FLOOR).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Specs;
    use crate::scoring::MatchScorer;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, CacheStore) {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::new(dir.path().join("data").join("cache.json"));
        (dir, cache)
    }

    fn patch(title: &str, price: f64, url: &str) -> EntryPatch {
        EntryPatch { title: Some(title.into()), price: Some(price), url: Some(url.into()), specs: None }
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let (_dir, cache) = store();
        assert!(cache.load("emag").await.unwrap().is_empty());
        assert!(cache.sites().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_then_load() {
        let (_dir, cache) = store();
        cache.upsert("emag", patch("Laptop", 3000.0, "https://e.ro/l")).await.unwrap();
        cache.upsert("emag", patch("Laptop", 3000.0, "https://e.ro/l")).await.unwrap();

        let entries = cache.load("emag").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].price, Some(3000.0));
        assert_eq!(cache.sites().await.unwrap(), vec!["emag"]);
    }

    #[tokio::test]
    async fn test_upsert_preserves_fields_left_unset() {
        let (_dir, cache) = store();
        let with_specs = EntryPatch {
            specs: Some(Specs::Other(json!({ "ram": "16GB" }))),
            ..patch("Laptop", 3000.0, "https://e.ro/l")
        };
        cache.upsert("emag", with_specs).await.unwrap();

        let before = cache.load("emag").await.unwrap()[0].saved_at;
        let update = EntryPatch { price: Some(2500.0), url: Some("https://e.ro/l".into()), ..Default::default() };
        cache.upsert("emag", update).await.unwrap();

        let entry = &cache.load("emag").await.unwrap()[0];
        assert_eq!(entry.title.as_deref(), Some("Laptop"));
        assert_eq!(entry.price, Some(2500.0));
        assert_eq!(entry.specs, Some(Specs::Other(json!({ "ram": "16GB" }))));
        assert!(entry.saved_at >= before);
    }

    #[tokio::test]
    async fn test_get_for_query_normalizes() {
        let (_dir, cache) = store();
        cache
            .upsert_for_query("emag", "Samsung S23", patch("Telefon Samsung Galaxy S23", 3500.0, "https://e.ro/s23"))
            .await
            .unwrap();

        for query in ["Samsung S23", "samsung s23", "  SAMSUNG   s23 "] {
            let hit = cache.get_for_query("emag", query).await.unwrap().unwrap();
            assert_eq!(hit.url.as_deref(), Some("https://e.ro/s23"));
        }
        assert!(cache.get_for_query("emag", "samsung s24").await.unwrap().is_none());
        assert!(cache.get_for_query("altex", "samsung s23").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_for_query_without_url_skips_index() {
        let (_dir, cache) = store();
        let no_url = EntryPatch { title: Some("Frigider".into()), price: Some(900.0), ..Default::default() };
        cache.upsert_for_query("altex", "frigider", no_url).await.unwrap();

        assert_eq!(cache.load("altex").await.unwrap().len(), 1);
        assert!(cache.get_for_query("altex", "frigider").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_best_respects_floor() {
        let (_dir, cache) = store();
        cache.upsert("emag", patch("Mouse Logitech G502 Hero", 250.0, "https://e.ro/m")).await.unwrap();

        let hit = cache.find_best("emag", "logitech g502 hero", &MatchScorer::Basic).await.unwrap();
        assert!(hit.is_some());

        let below = |_: &str, _: &str| 89.9;
        assert!(cache.find_best("emag", "anything", &below).await.unwrap().is_none());

        let exact = |_: &str, _: &str| 90.0;
        assert!(cache.find_best("emag", "anything", &exact).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_best_picks_maximum() {
        let (_dir, cache) = store();
        cache.upsert("emag", patch("alpha", 1.0, "https://e.ro/a")).await.unwrap();
        cache.upsert("emag", patch("beta", 2.0, "https://e.ro/b")).await.unwrap();

        let scorer = |title: &str, _: &str| if title == "beta" { 97.0 } else { 91.0 };
        let hit = cache.find_best("emag", "q", &scorer).await.unwrap().unwrap();
        assert_eq!(hit.title.as_deref(), Some("beta"));
    }

    #[tokio::test]
    async fn test_items_only_file() {
        let (_dir, cache) = store();
        tokio::fs::create_dir_all(cache.path().parent().unwrap()).await.unwrap();
        tokio::fs::write(
            cache.path(),
            serde_json::to_vec(&json!({
                "items": { "pcgarage": [{ "title": "SSD Samsung 990 PRO 2TB", "price": 900.0,
                                          "url": "https://p.ro/990", "saved_at": 1712345678.5 }] }
            }))
            .unwrap(),
        )
        .await
        .unwrap();

        assert!(cache.get_for_query("pcgarage", "ssd samsung 990 pro 2tb").await.unwrap().is_none());
        let hit = cache.find_best("pcgarage", "ssd samsung 990 pro 2tb", &MatchScorer::Basic).await.unwrap();
        assert_eq!(hit.unwrap().url.as_deref(), Some("https://p.ro/990"));
    }

    #[tokio::test]
    async fn test_upsert_keeps_entries_it_cannot_read() {
        let (_dir, cache) = store();
        tokio::fs::create_dir_all(cache.path().parent().unwrap()).await.unwrap();
        tokio::fs::write(
            cache.path(),
            serde_json::to_vec(&json!({
                "items": { "emag": [
                    { "url": "https://e.ro/old", "saved_at": null },
                    { "title": "Mouse", "url": "https://e.ro/m", "saved_at": 1.0, "category": "periferice" }
                ] },
                "query_index": { "emag": { "old laptop": "https://e.ro/old" } }
            }))
            .unwrap(),
        )
        .await
        .unwrap();

        cache.upsert_for_query("emag", "televizor", patch("Televizor", 2000.0, "https://e.ro/tv")).await.unwrap();

        let raw: serde_json::Value = serde_json::from_slice(&tokio::fs::read(cache.path()).await.unwrap()).unwrap();
        let emag = raw["items"]["emag"].as_array().unwrap();
        let urls: Vec<&str> = emag.iter().filter_map(|e| e["url"].as_str()).collect();
        assert_eq!(urls, vec!["https://e.ro/m", "https://e.ro/tv", "https://e.ro/old"]);
        assert_eq!(emag[0]["category"], "periferice");
        assert_eq!(raw["query_index"]["emag"]["old laptop"], "https://e.ro/old");
        assert_eq!(raw["query_index"]["emag"]["televizor"], "https://e.ro/tv");

        let mouse = cache.find_best("emag", "mouse", &MatchScorer::Basic).await.unwrap().unwrap();
        assert_eq!(mouse.extra["category"], "periferice");
    }

    #[tokio::test]
    async fn test_legacy_file_migrates_on_write() {
        let (_dir, cache) = store();
        tokio::fs::create_dir_all(cache.path().parent().unwrap()).await.unwrap();
        tokio::fs::write(
            cache.path(),
            r#"{ "altex": [{ "title": "Cuptor", "price": 700.0, "url": "https://a.ro/c", "saved_at": 1.0 }] }"#,
        )
        .await
        .unwrap();

        assert_eq!(cache.load("altex").await.unwrap().len(), 1);

        cache.upsert_for_query("altex", "cuptor", patch("Cuptor", 650.0, "https://a.ro/c")).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(cache.path()).await.unwrap()).unwrap();
        assert_eq!(raw["items"]["altex"].as_array().unwrap().len(), 1);
        assert_eq!(raw["query_index"]["altex"]["cuptor"], "https://a.ro/c");
        assert!(raw.get("altex").is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported_and_kept() {
        let (_dir, cache) = store();
        tokio::fs::create_dir_all(cache.path().parent().unwrap()).await.unwrap();
        tokio::fs::write(cache.path(), "{ truncated").await.unwrap();

        assert!(matches!(cache.load("emag").await, Err(Error::CacheCorrupt { .. })));
        assert!(cache.upsert("emag", patch("x", 1.0, "https://e.ro/x")).await.is_err());
        assert_eq!(tokio::fs::read_to_string(cache.path()).await.unwrap(), "{ truncated");
    }

    #[tokio::test]
    async fn test_concurrent_upserts_from_clones_do_not_lose_writes() {
        let (_dir, cache) = store();
        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.upsert("emag", patch(&format!("item {i}"), 1.0, &format!("https://e.ro/{i}"))).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(cache.load("emag").await.unwrap().len(), 8);
    }
}
