//! Word tokens, query coverage and digit-run checks.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Conjunctions and prepositions (Romanian and English) that carry no
/// product information.
pub const STOP_WORDS: &[&str] = &["si", "sau", "de", "la", "cu", "in", "pe", "pentru", "the", "and", "with"];

/// Penalty when a query number is absent from the title (model, size, capacity).
pub const MISSING_NUMBER_PENALTY: f64 = 25.0;

/// Penalty when the title carries an extra short number (size or variant code).
pub const EXTRA_SHORT_NUMBER_PENALTY: f64 = 15.0;

/// Penalty when the title carries an extra four-digit number (usually a year).
pub const EXTRA_YEAR_PENALTY: f64 = 5.0;

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid digit regex"));

/// Lowercased word tokens with stop words removed.
pub fn tokenize_words(s: &str) -> Vec<String> {
    s.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
        .map(String::from)
        .collect()
}

/// Fraction of query tokens present in the title's token set.
///
/// A query without tokens has zero coverage.
pub fn token_coverage(title: &str, query: &str) -> f64 {
    let title_tokens: HashSet<String> = tokenize_words(title).into_iter().collect();
    let query_tokens = tokenize_words(query);

    if query_tokens.is_empty() {
        return 0.0;
    }

    let hits = query_tokens.iter().filter(|t| title_tokens.contains(*t)).count();
    hits as f64 / query_tokens.len() as f64
}

/// Distinct digit runs in `s`.
pub fn digit_runs(s: &str) -> HashSet<&str> {
    DIGIT_RUN.find_iter(s).map(|m| m.as_str()).collect()
}

/// Penalty for numbers that disagree between title and query.
///
/// Each rule fires at most once no matter how many runs trigger it.
pub fn numeric_mismatch_penalty(title: &str, query: &str) -> f64 {
    let query_nums = digit_runs(query);
    let title_nums = digit_runs(title);

    let mut penalty = 0.0;

    if !query_nums.is_subset(&title_nums) {
        penalty += MISSING_NUMBER_PENALTY;
    }

    let extra: Vec<&str> = title_nums.difference(&query_nums).copied().collect();
    if extra.iter().any(|n| n.chars().count() <= 2) {
        penalty += EXTRA_SHORT_NUMBER_PENALTY;
    }
    if extra.iter().any(|n| n.chars().count() == 4) {
        penalty += EXTRA_YEAR_PENALTY;
    }

    penalty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_stop_words_and_punctuation() {
        let tokens = tokenize_words("Laptop ASUS, cu 16GB si SSD-512 pentru gaming");
        assert_eq!(tokens, vec!["laptop", "asus", "16gb", "ssd", "512", "gaming"]);
    }

    #[test]
    fn test_tokenize_keeps_diacritics() {
        let tokens = tokenize_words("Mașină de spălat");
        assert_eq!(tokens, vec!["mașină", "spălat"]);
    }

    #[test]
    fn test_coverage_full_partial_empty() {
        assert_eq!(token_coverage("Televizor Samsung 55 QLED", "samsung 55"), 1.0);
        assert_eq!(token_coverage("Televizor Samsung", "samsung lg"), 0.5);
        assert_eq!(token_coverage("anything", "si de la"), 0.0);
        assert_eq!(token_coverage("anything", ""), 0.0);
    }

    #[test]
    fn test_digit_runs() {
        let runs = digit_runs("RTX 4070 12GB 2023");
        assert_eq!(runs, HashSet::from(["4070", "12", "2023"]));
    }

    #[test]
    fn test_penalty_missing_query_number() {
        assert_eq!(numeric_mismatch_penalty("iPhone 15", "iphone 15 128"), MISSING_NUMBER_PENALTY);
    }

    #[test]
    fn test_penalty_extra_numbers() {
        assert_eq!(numeric_mismatch_penalty("Monitor 27 inch", "monitor"), EXTRA_SHORT_NUMBER_PENALTY);
        assert_eq!(numeric_mismatch_penalty("Monitor 2024", "monitor"), EXTRA_YEAR_PENALTY);
        assert_eq!(numeric_mismatch_penalty("Monitor 240", "monitor"), 0.0);
        assert_eq!(
            numeric_mismatch_penalty("Televizor Samsung 43 2022", "televizor samsung 55 2023"),
            MISSING_NUMBER_PENALTY + EXTRA_SHORT_NUMBER_PENALTY + EXTRA_YEAR_PENALTY
        );
    }

    #[test]
    fn test_penalty_applies_once_per_rule() {
        let one = numeric_mismatch_penalty("Kit 1 2", "kit 7");
        let many = numeric_mismatch_penalty("Kit 1 2 3 4", "kit 7 8 9");
        assert_eq!(one, many);
    }

    #[test]
    fn test_penalty_non_decreasing_in_missing_runs() {
        let title = "SSD Samsung 990 PRO";
        let mut previous = numeric_mismatch_penalty(title, "ssd samsung 990");
        for query in ["ssd samsung 990 1000", "ssd samsung 990 1000 2000", "ssd samsung 1000 2000 3000"] {
            let penalty = numeric_mismatch_penalty(title, query);
            assert!(penalty >= previous);
            previous = penalty;
        }
    }
}
