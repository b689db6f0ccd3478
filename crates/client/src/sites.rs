//! Catalog site profiles.
//!
//! A profile is everything site-specific the resolver needs: how to build
//! the search URL, where listings live in the markup, which scorer to use
//! and when to stop scanning.

use std::fmt;

use pricescout_core::{Error, MatchScorer};
use url::Url;

use crate::extract::{ListingSelectors, SelectorExtractor};
use crate::fetch::url::{SpaceStyle, canonicalize, encode_query};

/// One catalog site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteProfile {
    /// Cache key and CLI name.
    pub name: &'static str,
    /// Human-readable store name.
    pub label: &'static str,
    /// Search URL with a `{query}` placeholder.
    pub search_template: &'static str,
    pub space_style: SpaceStyle,
    pub selectors: ListingSelectors,
    pub scorer: MatchScorer,
    /// Stop once more than this many listings were inspected and a winner exists.
    pub scan_cap: Option<usize>,
    /// Whether the winner's product page carries a spec table worth caching.
    pub spec_page: bool,
}

pub const EMAG: SiteProfile = SiteProfile {
    name: "emag",
    label: "eMAG",
    search_template: "https://www.emag.ro/search/{query}",
    space_style: SpaceStyle::Percent,
    selectors: ListingSelectors {
        item: "div.card-item",
        title: "a.card-v2-title",
        price: "p.product-new-price",
        link: "a.js-product-url",
    },
    scorer: MatchScorer::Basic,
    scan_cap: Some(60),
    spec_page: false,
};

pub const PCGARAGE: SiteProfile = SiteProfile {
    name: "pcgarage",
    label: "PC Garage",
    search_template: "https://www.pcgarage.ro/cauta/{query}/",
    space_style: SpaceStyle::Plus,
    selectors: ListingSelectors {
        item: "div.product_b_container",
        title: "div.product_box_name h2 a",
        price: "div.product_box_price_container p.price",
        link: "div.product_box_name h2 a",
    },
    scorer: MatchScorer::Precise,
    scan_cap: None,
    spec_page: true,
};

pub const ALTEX: SiteProfile = SiteProfile {
    name: "altex",
    label: "Altex",
    search_template: "https://altex.ro/cauta/?q={query}",
    space_style: SpaceStyle::Percent,
    selectors: ListingSelectors {
        item: "li.Products-item",
        title: "span.Product-name",
        price: "span.Price-int",
        link: "a[title]",
    },
    scorer: MatchScorer::Basic,
    scan_cap: None,
    spec_page: false,
};

pub const VEXIO: SiteProfile = SiteProfile {
    name: "vexio",
    label: "Vexio",
    search_template: "https://www.vexio.ro/search/?q={query}",
    space_style: SpaceStyle::Plus,
    selectors: ListingSelectors {
        item: "article.product-box",
        title: "h2.name a",
        price: "div.price strong",
        link: "h2.name a",
    },
    scorer: MatchScorer::Basic,
    scan_cap: None,
    spec_page: false,
};

/// Every built-in profile.
pub const ALL_SITES: &[SiteProfile] = &[PCGARAGE, VEXIO, ALTEX, EMAG];

impl SiteProfile {
    /// Look up a built-in profile by name (case-insensitive).
    pub fn by_name(name: &str) -> Option<&'static SiteProfile> {
        let name = name.trim();
        ALL_SITES.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Like [`SiteProfile::by_name`], with an error naming the known sites.
    pub fn lookup(name: &str) -> Result<&'static SiteProfile, Error> {
        Self::by_name(name).ok_or_else(|| {
            let known: Vec<&str> = ALL_SITES.iter().map(|s| s.name).collect();
            Error::InvalidInput(format!("unknown site {name:?} (known: {})", known.join(", ")))
        })
    }

    /// Search results URL for `query`.
    pub fn search_url(&self, query: &str) -> Result<Url, Error> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be empty".into()));
        }
        let raw = self.search_template.replace("{query}", &encode_query(query, self.space_style));
        Ok(canonicalize(&raw)?)
    }

    pub fn extractor(&self) -> Result<SelectorExtractor, Error> {
        SelectorExtractor::new(&self.selectors)
    }
}

impl fmt::Display for SiteProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_urls() {
        assert_eq!(EMAG.search_url("Samsung S23").unwrap().as_str(), "https://www.emag.ro/search/Samsung%20S23");
        assert_eq!(PCGARAGE.search_url("rtx 4070").unwrap().as_str(), "https://www.pcgarage.ro/cauta/rtx+4070/");
        assert_eq!(ALTEX.search_url(" frigider lg ").unwrap().as_str(), "https://altex.ro/cauta/?q=frigider%20lg");
        assert_eq!(VEXIO.search_url("ssd 2tb").unwrap().as_str(), "https://www.vexio.ro/search/?q=ssd+2tb");
    }

    #[test]
    fn test_search_url_rejects_blank_query() {
        assert!(matches!(EMAG.search_url("   "), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_by_name() {
        assert_eq!(SiteProfile::by_name("eMAG").map(|s| s.name), Some("emag"));
        assert_eq!(SiteProfile::by_name(" pcgarage ").map(|s| s.name), Some("pcgarage"));
        assert!(SiteProfile::by_name("amazon").is_none());
    }

    #[test]
    fn test_lookup_lists_known_sites() {
        let site = SiteProfile::lookup("altex").unwrap();
        assert_eq!(site.to_string(), "altex");

        let err = SiteProfile::lookup("amazon").unwrap_err();
        assert!(err.to_string().contains("pcgarage, vexio, altex, emag"));
    }

    #[test]
    fn test_every_profile_builds_an_extractor() {
        for site in ALL_SITES {
            assert!(site.extractor().is_ok(), "{site}");
        }
    }

    #[test]
    fn test_default_config_sites_are_known() {
        for name in pricescout_core::AppConfig::default().sites {
            assert!(SiteProfile::by_name(&name).is_some(), "{name}");
        }
    }

    #[test]
    fn test_scoring_profiles() {
        assert_eq!(PCGARAGE.scorer, MatchScorer::Precise);
        assert!(PCGARAGE.spec_page);
        assert_eq!(EMAG.scan_cap, Some(60));
    }
}
