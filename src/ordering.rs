// src/ordering.rs
use std::cmp::Reverse;

use crate::models::{Product, SortMode};

/// Returns a newly ordered copy of `items`; the input is left untouched.
///
/// Both modes rely on `slice::sort_by_key` being stable: products with equal
/// keys keep the relative position they had in the input.
pub fn order_items(items: &[Product], mode: SortMode) -> Vec<Product> {
    let mut ordered = items.to_vec();
    match mode {
        SortMode::Curated => ordered.sort_by_key(|p| p.order),
        SortMode::Newest => ordered.sort_by_key(|p| Reverse(p.created_at)),
    }
    ordered
}
