//! Positional selection heuristics.
//!
//! The catalog exposes no stable identifiers for its default category or for
//! the non-product entry at the top of a product list, so both are picked by
//! position. These positions are unverified against other catalog states and
//! are overridable through [`CrawlConfig`](crate::config::CrawlConfig).

/// Zero-based position of the category clicked when no name is given.
pub const DEFAULT_CATEGORY_POSITION: usize = 4;

/// Number of leading product-list links that are not products ("view all").
pub const PRODUCT_LINK_OFFSET: usize = 1;

/// How the category step picks what to click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySelection {
    /// First category whose trimmed label equals the name exactly.
    ByName(String),
    /// Fallback: whatever category sits at this position.
    ByPosition(usize),
}

/// Chooses between an exact-name match and the positional fallback.
pub fn category_selection(target: Option<&str>, default_position: usize) -> CategorySelection {
    match target {
        Some(name) => CategorySelection::ByName(name.to_string()),
        None => CategorySelection::ByPosition(default_position),
    }
}

/// Position in the product link list of the `index`-th product.
pub fn product_link_position(index: usize, offset: usize) -> usize {
    index + offset
}
