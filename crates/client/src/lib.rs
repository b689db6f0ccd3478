//! Client code for pricescout.
//!
//! This crate provides the politeness-aware page fetcher, site profiles,
//! candidate extraction and the resolution workflow used by the CLI.

pub mod extract;
pub mod fetch;
pub mod resolve;
pub mod sites;

pub use extract::{CandidateExtractor, ListingSelectors, SelectorExtractor, extract_spec_sheet, parse_price};
pub use fetch::{
    FetchOutcome, FetchPolicy, HostThrottle, HttpConfig, HttpPageClient, PageClient, ThrottledFetcher, canonicalize,
};
pub use resolve::{Pick, Resolver, pick_winner};
pub use sites::{ALL_SITES, SiteProfile};
