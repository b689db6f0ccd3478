//! Listing records shared by the scorer, the cache and the resolver.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A listing scraped from a search results page.
///
/// Only the title is required for scoring; price and URL decide eligibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub price: Option<f64>,
    pub url: Option<String>,
}

impl Candidate {
    /// A candidate can win only with a positive price and a non-empty URL.
    pub fn is_eligible(&self) -> bool {
        self.price.is_some_and(|p| p > 0.0) && self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

/// Product details scraped from a listing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecSheet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specs_text: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl SpecSheet {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.specs_text.is_none() && self.attributes.is_empty()
    }
}

/// Spec blob attached to a cached entry.
///
/// Sheets written by this crate parse as [`Specs::Sheet`]; anything else found
/// in an existing cache file is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Specs {
    Sheet(SpecSheet),
    Other(Value),
}

/// Best-known match for a query history on one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specs: Option<Specs>,
    #[serde(with = "epoch_seconds", default = "epoch_zero")]
    pub saved_at: DateTime<Utc>,
    /// Fields this crate does not know about, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResolvedEntry {
    /// Trimmed URL used as the primary identity key.
    pub fn url_key(&self) -> &str {
        self.url.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Trimmed, lowercased title used as the fallback identity key.
    pub fn title_key(&self) -> String {
        self.title.as_deref().map(|t| t.trim().to_lowercase()).unwrap_or_default()
    }
}

/// Field-wise update for a cached entry. `None` fields never overwrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub url: Option<String>,
    pub specs: Option<Specs>,
}

impl EntryPatch {
    pub fn url_key(&self) -> &str {
        self.url.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn title_key(&self) -> String {
        self.title.as_deref().map(|t| t.trim().to_lowercase()).unwrap_or_default()
    }

    /// Copy the set fields onto `entry` and stamp it.
    pub fn apply_to(&self, entry: &mut ResolvedEntry, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            entry.title = Some(title.clone());
        }
        if let Some(price) = self.price {
            entry.price = Some(price);
        }
        if let Some(url) = &self.url {
            entry.url = Some(url.clone());
        }
        if let Some(specs) = &self.specs {
            entry.specs = Some(specs.clone());
        }
        entry.saved_at = now;
    }

    pub fn into_entry(self, now: DateTime<Utc>) -> ResolvedEntry {
        ResolvedEntry {
            title: self.title,
            price: self.price,
            url: self.url,
            specs: self.specs,
            saved_at: now,
            extra: Map::new(),
        }
    }
}

impl From<Candidate> for EntryPatch {
    fn from(c: Candidate) -> Self {
        Self { title: Some(c.title), price: c.price, url: c.url, specs: None }
    }
}

fn epoch_zero() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

/// `saved_at` is stored as fractional seconds since the Unix epoch.
mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(dt.timestamp_micros() as f64 / 1_000_000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let secs = f64::deserialize(d)?;
        if !secs.is_finite() {
            return Err(D::Error::custom("saved_at is not a finite number"));
        }
        DateTime::from_timestamp_micros((secs * 1_000_000.0).round() as i64)
            .ok_or_else(|| D::Error::custom(format!("saved_at out of range: {secs}")))
    }
}
