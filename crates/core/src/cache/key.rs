//! Lookup keys for the query index.

/// Normalize a query for exact-match lookup: lowercase, collapse whitespace.
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_query_variants_agree() {
        let expected = "samsung s23";
        assert_eq!(normalize_query("Samsung S23"), expected);
        assert_eq!(normalize_query("samsung s23"), expected);
        assert_eq!(normalize_query("  SAMSUNG   s23 "), expected);
        assert_eq!(normalize_query("samsung\t\ns23"), expected);
    }

    #[test]
    fn test_normalize_query_empty() {
        assert_eq!(normalize_query(""), "");
        assert_eq!(normalize_query("   "), "");
    }

    #[test]
    fn test_normalize_query_unicode() {
        assert_eq!(normalize_query("MAȘINĂ  de Spălat"), "mașină de spălat");
    }
}
