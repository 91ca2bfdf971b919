// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Gigs.ma

//! Meilisearch client wrapper: index configuration, bulk document ingest and
//! query translation for the listings index.

use crate::error::SearchError;
use crate::models::search::{
    IndexConfiguration, ListingSummary, PageMeta, PaginatedResult, QueryRequest, SearchDocument,
    SortMode, DEFAULT_PER_PAGE, MAX_PER_PAGE,
};
use meilisearch_sdk::client::Client;
use meilisearch_sdk::settings::Settings;
use meilisearch_sdk::task_info::TaskInfo;
use tracing::debug;

/// Meilisearch client wrapper for the listings index
pub struct SearchIndex {
    client: Client,
    index_name: String,
}

impl SearchIndex {
    /// Create a new Meilisearch client. Accepts a bare `host:port` and
    /// prefixes `http://` when no scheme is given.
    pub fn new(
        host: &str,
        api_key: Option<String>,
        index_name: String,
    ) -> Result<Self, SearchError> {
        let url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };

        let client = Client::new(&url, api_key).map_err(classify)?;

        Ok(Self { client, index_name })
    }

    /// Apply the index configuration (searchable/filterable/sortable fields
    /// and ranking rules). Idempotent: Meilisearch settings are replaced
    /// wholesale, so re-applying an identical configuration changes nothing.
    /// Safe to call before any documents exist.
    pub async fn apply_configuration(
        &self,
        config: &IndexConfiguration,
    ) -> Result<(), SearchError> {
        let settings = Settings::new()
            .with_searchable_attributes(config.searchable.iter().map(String::as_str))
            .with_filterable_attributes(config.filterable.iter().map(String::as_str))
            .with_sortable_attributes(config.sortable.iter().map(String::as_str))
            .with_ranking_rules(config.ranking_rules.iter().map(String::as_str));

        let task = self
            .client
            .index(&self.index_name)
            .set_settings(&settings)
            .await
            .map_err(classify)?;

        self.await_task(task).await?;

        debug!(index = %self.index_name, "applied index configuration");
        Ok(())
    }

    /// Upsert one batch of projected documents, keyed by `id`. Waits for the
    /// index to process the batch so rejections surface here rather than
    /// silently later.
    pub async fn submit_batch(&self, documents: &[SearchDocument]) -> Result<(), SearchError> {
        if documents.is_empty() {
            return Ok(());
        }

        let task = self
            .client
            .index(&self.index_name)
            .add_documents(documents, Some("id"))
            .await
            .map_err(classify)?;

        self.await_task(task).await
    }

    /// Remove a listing's document from the index (hard-deleted source row).
    pub async fn delete_listing(&self, listing_id: &str) -> Result<(), SearchError> {
        let task = self
            .client
            .index(&self.index_name)
            .delete_document(listing_id)
            .await
            .map_err(classify)?;

        self.await_task(task).await
    }

    /// Translate a structured query request into an index query, execute it
    /// and normalize the response into the paginated listing contract.
    pub async fn search(&self, request: &QueryRequest) -> Result<PaginatedResult, SearchError> {
        let window = page_window(request)?;
        let filter = build_filter(request)?;
        let sort = sort_expression(request.sort.unwrap_or_default());

        let index = self.client.index(&self.index_name);
        let sort_slice;
        let mut query = index.search();

        if let Some(term) = request.term.as_deref() {
            query.with_query(term);
        }
        query.with_filter(&filter);

        if let Some(expr) = sort {
            sort_slice = [expr];
            query.with_sort(&sort_slice);
        }

        query.with_offset(window.offset).with_limit(window.limit);

        let results = query
            .execute::<SearchDocument>()
            .await
            .map_err(classify)?;

        // total comes from the index's match count; no second relational
        // round trip
        let total = results.estimated_total_hits.unwrap_or(0) as u64;

        let data: Vec<ListingSummary> = results
            .hits
            .into_iter()
            .map(|hit| ListingSummary::from(hit.result))
            .collect();

        Ok(PaginatedResult {
            data,
            meta: PageMeta::new(window.page, window.per_page, total),
        })
    }

    /// Wait for an enqueued index task and surface task-level failures as
    /// rejections.
    async fn await_task(&self, task: TaskInfo) -> Result<(), SearchError> {
        let task = task
            .wait_for_completion(&self.client, None, None)
            .await
            .map_err(classify)?;

        if task.is_failure() {
            return Err(SearchError::IndexRejected(
                task.unwrap_failure().to_string(),
            ));
        }

        Ok(())
    }
}

/// Map SDK errors onto the taxonomy: an answer from the index that refuses
/// the request is a rejection; everything else (transport, timeout, parse)
/// counts as the index being unavailable.
fn classify(err: meilisearch_sdk::errors::Error) -> SearchError {
    match err {
        meilisearch_sdk::errors::Error::Meilisearch(e) => SearchError::IndexRejected(e.to_string()),
        other => SearchError::IndexUnavailable(other.to_string()),
    }
}

struct PageWindow {
    page: u32,
    per_page: u32,
    offset: usize,
    limit: usize,
}

/// Resolve the pagination window. Page must be >= 1; page size is clamped
/// into 1..=MAX_PER_PAGE rather than rejected.
fn page_window(request: &QueryRequest) -> Result<PageWindow, SearchError> {
    let page = request.page.unwrap_or(1);
    if page == 0 {
        return Err(SearchError::InvalidQuery(
            "page must be at least 1".to_string(),
        ));
    }

    let per_page = request
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    Ok(PageWindow {
        page,
        per_page,
        offset: (page as usize - 1) * per_page as usize,
        limit: per_page as usize,
    })
}

/// Build the conjunctive filter expression. Only active listings are ever
/// visible to queries; non-active statuses stay in the index but are
/// filtered here.
fn build_filter(request: &QueryRequest) -> Result<String, SearchError> {
    let mut conjuncts = vec!["status = active".to_string()];

    if let Some(category_id) = request.category_id.as_deref() {
        conjuncts.push(format!("category_id = {}", quote_value(category_id)));
    }
    if let Some(city_id) = request.city_id.as_deref() {
        conjuncts.push(format!("city_id = {}", quote_value(city_id)));
    }

    if let (Some(min), Some(max)) = (request.price_min, request.price_max) {
        if min > max {
            return Err(SearchError::InvalidQuery(format!(
                "price_min {min} exceeds price_max {max}"
            )));
        }
    }
    if let Some(min) = request.price_min {
        conjuncts.push(format!("base_price >= {min}"));
    }
    if let Some(max) = request.price_max {
        conjuncts.push(format!("base_price <= {max}"));
    }

    Ok(conjuncts.join(" AND "))
}

/// Map the sort mode to an index sort key. `Rating` has no index field and
/// falls back to relevance ranking (no sort parameter).
fn sort_expression(sort: SortMode) -> Option<&'static str> {
    match sort {
        SortMode::Recency => Some("created_at_ms:desc"),
        SortMode::PriceAsc => Some("base_price:asc"),
        SortMode::PriceDesc => Some("base_price:desc"),
        SortMode::Rating => None,
    }
}

/// Quote a filter value, escaping backslashes and double quotes
fn quote_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_always_restricts_to_active() {
        let filter = build_filter(&QueryRequest::default()).unwrap();
        assert_eq!(filter, "status = active");
    }

    #[test]
    fn test_filter_conjoins_category_city_and_price_range() {
        let request = QueryRequest {
            category_id: Some("cat_plumbing".to_string()),
            city_id: Some("C1".to_string()),
            price_min: Some(10.0),
            price_max: Some(50.0),
            ..Default::default()
        };

        let filter = build_filter(&request).unwrap();
        assert_eq!(
            filter,
            "status = active AND category_id = \"cat_plumbing\" AND city_id = \"C1\" \
             AND base_price >= 10 AND base_price <= 50"
        );
    }

    #[test]
    fn test_filter_rejects_inverted_price_range() {
        let request = QueryRequest {
            price_min: Some(100.0),
            price_max: Some(10.0),
            ..Default::default()
        };

        assert!(matches!(
            build_filter(&request),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_filter_escapes_quotes_in_values() {
        let request = QueryRequest {
            city_id: Some("c\"1".to_string()),
            ..Default::default()
        };

        let filter = build_filter(&request).unwrap();
        assert!(filter.contains("city_id = \"c\\\"1\""));
    }

    #[test]
    fn test_sort_expression_mapping() {
        assert_eq!(
            sort_expression(SortMode::Recency),
            Some("created_at_ms:desc")
        );
        assert_eq!(sort_expression(SortMode::PriceAsc), Some("base_price:asc"));
        assert_eq!(
            sort_expression(SortMode::PriceDesc),
            Some("base_price:desc")
        );
        assert_eq!(sort_expression(SortMode::Rating), None);
    }

    #[test]
    fn test_page_window_defaults_and_offset() {
        let window = page_window(&QueryRequest::default()).unwrap();
        assert_eq!(window.page, 1);
        assert_eq!(window.per_page, DEFAULT_PER_PAGE);
        assert_eq!(window.offset, 0);

        let request = QueryRequest {
            page: Some(3),
            per_page: Some(20),
            ..Default::default()
        };
        let window = page_window(&request).unwrap();
        assert_eq!(window.offset, 40);
        assert_eq!(window.limit, 20);
    }

    #[test]
    fn test_page_window_clamps_per_page() {
        let request = QueryRequest {
            per_page: Some(500),
            ..Default::default()
        };
        let window = page_window(&request).unwrap();
        assert_eq!(window.per_page, MAX_PER_PAGE);

        let request = QueryRequest {
            per_page: Some(0),
            ..Default::default()
        };
        let window = page_window(&request).unwrap();
        assert_eq!(window.per_page, 1);
    }

    #[test]
    fn test_page_window_rejects_page_zero() {
        let request = QueryRequest {
            page: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            page_window(&request),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_client_url_normalization() {
        // Bare host:port gets an http scheme prefixed
        let index = SearchIndex::new("127.0.0.1:7700", None, "listings".to_string());
        assert!(index.is_ok());

        let index = SearchIndex::new("https://search.gigs.ma", None, "listings".to_string());
        assert!(index.is_ok());
    }
}
