//! Soft-block detection.
//!
//! Catalog sites often answer rate-limited or suspicious traffic with a normal
//! page whose body is a challenge or a "slow down" notice. These pages are
//! recognized by marker phrases in the markup.

/// Lowercase phrases that mark a page as a soft block.
pub const SOFT_BLOCK_MARKERS: &[&str] =
    &["captcha", "too many requests", "temporarily unavailable", "high traffic", "are you a human"];

/// Whether the page source contains any soft-block marker (case-insensitive).
pub fn is_soft_blocked(page_source: &str) -> bool {
    let lowered = page_source.to_lowercase();
    SOFT_BLOCK_MARKERS.iter().any(|m| lowered.contains(m))
}
