//! Core types and shared functionality for pricescout.
//!
//! This crate provides:
//! - Product model types (candidates, resolved entries, spec sheets)
//! - Title/query match scoring
//! - JSON-file result cache with a query index
//! - Unified error types
//! - Configuration loading and validation

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod scoring;

pub use cache::CacheStore;
pub use config::AppConfig;
pub use error::Error;
pub use model::{Candidate, EntryPatch, ResolvedEntry, SpecSheet, Specs};
pub use scoring::{MatchScorer, Scorer};
