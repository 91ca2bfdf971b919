// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Gigs.ma

use serde::{Deserialize, Serialize};

/// Upper bound on `per_page`; larger values are clamped, not rejected.
pub const MAX_PER_PAGE: u32 = 50;

/// Default page size when the request does not specify one.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Document shape stored in the search index. Derived from a listing and its
/// joined category/city/provider; disposable and fully rebuildable from the
/// relational store. The `id` mirrors the source listing id (upsert key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDocument {
    /// Mirrors the Listing id — the join key back to the relational store
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub base_price: f64,
    pub status: crate::models::listing::ListingStatus,
    pub category_id: String,
    pub category_name: String,
    pub city_id: String,
    pub city_name: String,
    /// Denormalized provider display name; empty string when the provider
    /// has none
    pub provider_name: String,
    /// Creation timestamp as epoch milliseconds, so the index sorts it
    /// numerically regardless of its native date handling
    pub created_at_ms: i64,
}

/// Index-side configuration: which fields are searchable (ordered — order
/// affects relevance for equal-rank matches), filterable and sortable, plus
/// the ranking rule sequence. Re-applying the same configuration is a no-op
/// with respect to observable query behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfiguration {
    pub searchable: Vec<String>,
    pub filterable: Vec<String>,
    pub sortable: Vec<String>,
    pub ranking_rules: Vec<String>,
}

impl Default for IndexConfiguration {
    fn default() -> Self {
        Self {
            searchable: vec![
                "title".to_string(),
                "description".to_string(),
                "category_name".to_string(),
                "city_name".to_string(),
                "provider_name".to_string(),
            ],
            filterable: vec![
                "status".to_string(),
                "category_id".to_string(),
                "city_id".to_string(),
                "base_price".to_string(),
            ],
            sortable: vec!["created_at_ms".to_string(), "base_price".to_string()],
            ranking_rules: vec![
                "words".to_string(),
                "typo".to_string(),
                "proximity".to_string(),
                "attribute".to_string(),
                "sort".to_string(),
                "exactness".to_string(),
            ],
        }
    }
}

/// Requested result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Newest listings first
    #[default]
    Recency,
    PriceAsc,
    PriceDesc,
    /// Rating is not an index field; this falls back to relevance ranking
    Rating,
}

/// Structured search request accepted by the query endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Free-text search term
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub city_id: Option<String>,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub sort: Option<SortMode>,
    /// 1-based page number
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// Public listing representation returned by search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub base_price: f64,
    pub category_id: String,
    pub category_name: String,
    pub city_id: String,
    pub city_name: String,
    pub provider_name: String,
    pub created_at_ms: i64,
}

impl From<SearchDocument> for ListingSummary {
    fn from(doc: SearchDocument) -> Self {
        ListingSummary {
            id: doc.id,
            title: doc.title,
            slug: doc.slug,
            description: doc.description,
            base_price: doc.base_price,
            category_id: doc.category_id,
            category_name: doc.category_name,
            city_id: doc.city_id,
            city_name: doc.city_name,
            provider_name: doc.provider_name,
            created_at_ms: doc.created_at_ms,
        }
    }
}

/// Pagination metadata; `total` comes from the index's reported match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl PageMeta {
    /// Build metadata for a result window. Upholds
    /// `total_pages == ceil(total / per_page)`.
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let per_page = per_page.max(1);
        PageMeta {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(u64::from(per_page)),
        }
    }
}

/// Paginated search response: at most `per_page` listing summaries plus
/// pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult {
    pub data: Vec<ListingSummary>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_meta_ceiling_division() {
        assert_eq!(PageMeta::new(1, 20, 0).total_pages, 0);
        assert_eq!(PageMeta::new(1, 20, 1).total_pages, 1);
        assert_eq!(PageMeta::new(1, 20, 20).total_pages, 1);
        assert_eq!(PageMeta::new(1, 20, 21).total_pages, 2);
        assert_eq!(PageMeta::new(1, 7, 50).total_pages, 8);
    }

    #[test]
    fn test_page_meta_zero_per_page_does_not_divide_by_zero() {
        let meta = PageMeta::new(1, 0, 10);
        assert_eq!(meta.per_page, 1);
        assert_eq!(meta.total_pages, 10);
    }

    #[test]
    fn test_sort_mode_deserializes_snake_case() {
        let sort: SortMode = serde_json::from_str("\"price_asc\"").unwrap();
        assert_eq!(sort, SortMode::PriceAsc);
        let sort: SortMode = serde_json::from_str("\"recency\"").unwrap();
        assert_eq!(sort, SortMode::Recency);
    }

    #[test]
    fn test_query_request_defaults_from_empty_body() {
        let req: QueryRequest = serde_json::from_str("{}").unwrap();
        assert!(req.term.is_none());
        assert!(req.sort.is_none());
        assert!(req.page.is_none());
    }
}
