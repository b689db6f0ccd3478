//! Title-to-query similarity scoring.
//!
//! Two variants are provided:
//!
//! - [`match_score`]: the better of a token-set ratio and a partial ratio,
//!   0–100. Any strong signal wins.
//! - [`precise_match_score`]: the base score scaled by query coverage
//!   (`0.5 + 0.5 × coverage`) minus a numeric mismatch penalty. Used where
//!   a wrong model number or capacity is costly. May go negative.
//!
//! Callers compare scores against [`RELEVANCE_FLOOR`], [`CONFIDENT_MATCH`] and
//! [`CACHE_MATCH_FLOOR`].

pub mod fuzz;
pub mod tokens;

use serde::{Deserialize, Serialize};

pub use tokens::{numeric_mismatch_penalty, token_coverage, tokenize_words};

/// Candidates scoring below this are not relevant.
pub const RELEVANCE_FLOOR: f64 = 60.0;

/// A candidate at or above this ends the scan early.
pub const CONFIDENT_MATCH: f64 = 95.0;

/// Minimum score for a fuzzy cache hit.
pub const CACHE_MATCH_FLOOR: f64 = 90.0;

/// Anything that scores a title against a query. Higher is better.
pub trait Scorer {
    fn score(&self, title: &str, query: &str) -> f64;
}

impl<F> Scorer for F
where
    F: Fn(&str, &str) -> f64,
{
    fn score(&self, title: &str, query: &str) -> f64 {
        self(title, query)
    }
}

/// Built-in scoring strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchScorer {
    #[default]
    Basic,
    Precise,
}

impl Scorer for MatchScorer {
    fn score(&self, title: &str, query: &str) -> f64 {
        match self {
            MatchScorer::Basic => match_score(title, query),
            MatchScorer::Precise => precise_match_score(title, query),
        }
    }
}

/// Base similarity: max of token-set and partial ratios on lowercased input.
pub fn match_score(title: &str, query: &str) -> f64 {
    let t = title.to_lowercase();
    let q = query.to_lowercase();
    fuzz::token_set_ratio(&q, &t).max(fuzz::partial_ratio(&q, &t))
}

/// Coverage-weighted score with numeric mismatch penalty.
pub fn precise_match_score(title: &str, query: &str) -> f64 {
    let base = match_score(title, query);
    let coverage = token_coverage(title, query);
    let penalty = numeric_mismatch_penalty(title, query);
    base * (0.5 + 0.5 * coverage) - penalty
}
