// src/filters.rs
use std::str::FromStr;

use crate::models::{Product, SortMode};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PAGE: usize = 1;
const MAX_QUERY_LENGTH: u64 = 100;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct ListingParams {
    #[serde(default)]
    #[validate(length(max = MAX_QUERY_LENGTH, message = "نص البحث طويل جداً"))]
    pub q: Option<String>,

    #[serde(default)]
    #[validate(range(min = 1, message = "رقم الصفحة يجب أن يكون 1 أو أكثر"))]
    pub page: Option<usize>,

    #[serde(default, deserialize_with = "deserialize_sort")]
    pub sort: Option<SortMode>,

    #[serde(default)]
    pub category: Option<Uuid>,
}

/// `sort=Newest`, `sort=NEWEST` and `sort=newest` all select the same mode;
/// an empty value means the listing default.
fn deserialize_sort<'de, D>(deserializer: D) -> Result<Option<SortMode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => SortMode::from_str(value)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("unknown sort mode: {}", value))),
    }
}

impl ListingParams {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(DEFAULT_PAGE).max(1)
    }

    pub fn query(&self) -> &str {
        self.q.as_deref().unwrap_or("")
    }

    /// Query string carrying everything except the page number, used to build
    /// pagination links. Starts with `&` when not empty.
    pub fn filter_only_query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(q) = normalized_query(self.query()) {
            parts.push(format!("q={}", urlencoding::encode(q)));
        }
        if let Some(sort) = self.sort {
            parts.push(format!("sort={}", sort));
        }
        if let Some(category) = self.category {
            parts.push(format!("category={}", category));
        }

        if parts.is_empty() {
            String::new()
        } else {
            format!("&{}", parts.join("&"))
        }
    }
}

/// Result of the search variant of the name filter. `NoQuery` and an empty
/// `Results` lead to different empty-state messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome<T> {
    NoQuery,
    Results(Vec<T>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    NoQuery,
    Results,
}

/// Returns the trimmed query, or `None` when nothing is left to match on.
pub fn normalized_query(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

fn name_contains(name: &str, needle_lowercase: &str) -> bool {
    name.to_lowercase().contains(needle_lowercase)
}

/// Products whose name contains `query` as a literal, case-insensitive substring.
/// An empty or whitespace-only query keeps the whole collection.
pub fn filter_by_name(items: &[Product], query: &str) -> Vec<Product> {
    ItemFilter::by_name(query).apply(items)
}

/// Search variant of [`filter_by_name`]: an empty query is reported as `NoQuery`
/// instead of returning the full collection.
pub fn search(items: &[Product], query: &str) -> SearchOutcome<Product> {
    match normalized_query(query) {
        None => SearchOutcome::NoQuery,
        Some(_) => SearchOutcome::Results(filter_by_name(items, query)),
    }
}

/// Name substring and category membership, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    needle: Option<String>,
    category: Option<Uuid>,
}

impl ItemFilter {
    pub fn by_name(query: &str) -> Self {
        ItemFilter {
            needle: normalized_query(query).map(str::to_lowercase),
            category: None,
        }
    }

    pub fn in_category(mut self, category: Option<Uuid>) -> Self {
        self.category = category;
        self
    }

    pub fn is_noop(&self) -> bool {
        self.needle.is_none() && self.category.is_none()
    }

    pub fn matches(&self, product: &Product) -> bool {
        let name_ok = self
            .needle
            .as_deref()
            .is_none_or(|needle| name_contains(&product.name, needle));
        let category_ok = self.category.is_none_or(|id| product.category_id == id);
        name_ok && category_ok
    }

    pub fn apply(&self, items: &[Product]) -> Vec<Product> {
        if self.is_noop() {
            return items.to_vec();
        }
        items.iter().filter(|p| self.matches(p)).cloned().collect()
    }
}
