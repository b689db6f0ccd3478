//! On-disk cache document: parsing, legacy shape, atomic rewrite.
//!
//! Current shape:
//!
//! ```json
//! { "items": { "<site>": [entry, ...] }, "query_index": { "<site>": { "<query>": "<url>" } } }
//! ```
//!
//! Legacy shape (read only): `{ "<site>": [entry, ...] }`. Absence of `items`
//! marks a legacy document.
//!
//! Nothing found in a readable document is lost on rewrite: entries that do
//! not parse stay in their site list as raw JSON, unknown entry fields ride
//! along in [`ResolvedEntry::extra`], and unknown top-level keys are kept.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::key::normalize_query;
use crate::Error;
use crate::model::{EntryPatch, ResolvedEntry};

/// Per-site mapping from normalized query to listing URL.
pub type QueryIndex = BTreeMap<String, String>;

/// Full cache document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedStore {
    pub items: BTreeMap<String, Vec<ResolvedEntry>>,
    pub query_index: BTreeMap<String, QueryIndex>,
    /// Site entries that did not parse, written back after the parsed ones.
    pub unreadable: BTreeMap<String, Vec<Value>>,
    /// Top-level keys other than `items` and `query_index`.
    pub extra: Map<String, Value>,
}

#[derive(Serialize)]
struct Document<'a> {
    items: BTreeMap<&'a str, Vec<StoredItem<'a>>>,
    query_index: &'a BTreeMap<String, QueryIndex>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum StoredItem<'a> {
    Entry(&'a ResolvedEntry),
    Raw(&'a Value),
}

impl Serialize for PersistedStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut items: BTreeMap<&str, Vec<StoredItem<'_>>> = BTreeMap::new();
        for (site, entries) in &self.items {
            items.entry(site.as_str()).or_default().extend(entries.iter().map(StoredItem::Entry));
        }
        for (site, raw) in &self.unreadable {
            items.entry(site.as_str()).or_default().extend(raw.iter().map(StoredItem::Raw));
        }

        Document { items, query_index: &self.query_index, extra: &self.extra }.serialize(serializer)
    }
}

impl PersistedStore {
    /// Parse a cache document, accepting both the current and legacy shapes.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let Value::Object(mut root) = value else {
            return Err("top-level value is not an object".into());
        };

        match root.remove("items") {
            Some(Value::Object(items)) => {
                let query_index = match root.remove("query_index") {
                    Some(Value::Object(index)) => parse_query_index(index),
                    _ => BTreeMap::new(),
                };
                let (items, unreadable) = parse_sites(items);
                Ok(Self { items, query_index, unreadable, extra: root })
            }
            _ => {
                root.remove("query_index");
                let (items, unreadable) = parse_sites(root);
                Ok(Self { items, query_index: BTreeMap::new(), unreadable, extra: Map::new() })
            }
        }
    }

    /// Entries cached for `site`, in insertion order.
    pub fn entries(&self, site: &str) -> &[ResolvedEntry] {
        self.items.get(site).map(Vec::as_slice).unwrap_or_default()
    }

    /// Merge `patch` into the matching entry or append it.
    ///
    /// Matching tries the trimmed URL first, then the trimmed lowercased title;
    /// empty keys never match. A patch with neither key is ignored.
    pub fn upsert(&mut self, site: &str, mut patch: EntryPatch, now: DateTime<Utc>) {
        patch.url = patch.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        let url_key = patch.url_key().to_string();
        let title_key = patch.title_key();

        if url_key.is_empty() && title_key.is_empty() {
            tracing::debug!(site, "ignoring cache patch without url or title");
            return;
        }

        let entries = self.items.entry(site.to_string()).or_default();

        let position = entries
            .iter()
            .position(|e| !url_key.is_empty() && e.url_key() == url_key)
            .or_else(|| entries.iter().position(|e| !title_key.is_empty() && e.title_key() == title_key));

        match position {
            Some(i) => patch.apply_to(&mut entries[i], now),
            None => entries.push(patch.into_entry(now)),
        }
    }

    /// Point the normalized `query` at `url` for `site`.
    pub fn index_query(&mut self, site: &str, query: &str, url: &str) {
        self.query_index
            .entry(site.to_string())
            .or_default()
            .insert(normalize_query(query), url.trim().to_string());
    }

    /// Resolve an exact query through the index back to its entry.
    pub fn get_for_query(&self, site: &str, query: &str) -> Option<&ResolvedEntry> {
        let url = self.query_index.get(site)?.get(&normalize_query(query))?;
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        self.entries(site).iter().find(|e| e.url_key() == url)
    }
}

type SiteEntries = (BTreeMap<String, Vec<ResolvedEntry>>, BTreeMap<String, Vec<Value>>);

fn parse_sites(map: Map<String, Value>) -> SiteEntries {
    let mut items = BTreeMap::new();
    let mut unreadable: BTreeMap<String, Vec<Value>> = BTreeMap::new();

    for (site, value) in map {
        let mut entries = Vec::new();
        match value {
            Value::Array(raw) => {
                for item in raw {
                    match serde_json::from_value::<ResolvedEntry>(item.clone()) {
                        Ok(entry) => entries.push(entry),
                        Err(e) => {
                            tracing::debug!(site = %site, "keeping unreadable cache entry as is: {e}");
                            unreadable.entry(site.clone()).or_default().push(item);
                        }
                    }
                }
            }
            other => tracing::debug!(site = %site, "site value is not a list, dropping: {other}"),
        }
        items.insert(site, entries);
    }

    (items, unreadable)
}

fn parse_query_index(map: Map<String, Value>) -> BTreeMap<String, QueryIndex> {
    map.into_iter()
        .filter_map(|(site, value)| match value {
            Value::Object(queries) => {
                let index = queries
                    .into_iter()
                    .filter_map(|(q, url)| match url {
                        Value::String(url) => Some((q, url)),
                        _ => None,
                    })
                    .collect();
                Some((site, index))
            }
            _ => None,
        })
        .collect()
}

/// Read the cache document. A missing or blank file is an empty store.
pub async fn read(path: &Path) -> Result<PersistedStore, Error> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PersistedStore::default()),
        Err(source) => return Err(Error::CacheIo { path: path.to_path_buf(), source }),
    };

    if text.trim().is_empty() {
        return Ok(PersistedStore::default());
    }

    let value: Value = serde_json::from_str(&text)
        .map_err(|e| Error::CacheCorrupt { path: path.to_path_buf(), reason: e.to_string() })?;

    PersistedStore::from_value(value).map_err(|reason| Error::CacheCorrupt { path: path.to_path_buf(), reason })
}

/// Rewrite the whole document: temp file in the same directory, then rename.
pub async fn write(path: &Path, store: &PersistedStore) -> Result<(), Error> {
    let io_err = |source| Error::CacheIo { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let json = serde_json::to_vec_pretty(store)
        .map_err(|e| Error::CacheCorrupt { path: path.to_path_buf(), reason: e.to_string() })?;

    let tmp = temp_path(path);
    let written = match tokio::fs::write(&tmp, json).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if let Err(source) = written {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(io_err(source));
    }

    Ok(())
}

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Sibling temp file, unique per process and per write.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "cache.json".into());
    name.push(format!(".{}.{}.tmp", std::process::id(), TEMP_SEQ.fetch_add(1, Ordering::Relaxed)));
    path.with_file_name(name)
}
