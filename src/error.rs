// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Gigs.ma

//! Error taxonomy for the search subsystem.
//!
//! Sync-side policy: `IndexUnavailable` and `DataSourceUnavailable` are
//! retryable; `IndexRejected` is not (a malformed document or configuration
//! will not fix itself). Query-time failures are surfaced to the caller for
//! that single request and never retried automatically.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    /// Transport/connection failure talking to the search index
    #[error("search index unavailable: {0}")]
    IndexUnavailable(String),

    /// The index rejected a document batch or configuration payload
    #[error("search index rejected request: {0}")]
    IndexRejected(String),

    /// Relational read failure; aborts a sync run since no documents can
    /// be produced
    #[error("data source unavailable: {0}")]
    DataSourceUnavailable(#[from] sqlx::Error),

    /// Malformed query request surfaced to the caller
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A full or incremental sync is already in flight
    #[error("a sync run is already in progress")]
    SyncInProgress,
}

impl SearchError {
    /// Whether the retry policy should attempt this operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SearchError::IndexUnavailable(_) | SearchError::DataSourceUnavailable(_)
        )
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = match self {
            SearchError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            SearchError::IndexUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SearchError::IndexRejected(_) => StatusCode::BAD_GATEWAY,
            SearchError::SyncInProgress => StatusCode::CONFLICT,
            SearchError::DataSourceUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SearchError::IndexUnavailable("timeout".to_string()).is_retryable());
        assert!(SearchError::DataSourceUnavailable(sqlx::Error::PoolClosed).is_retryable());
        assert!(!SearchError::IndexRejected("bad field".to_string()).is_retryable());
        assert!(!SearchError::InvalidQuery("page 0".to_string()).is_retryable());
        assert!(!SearchError::SyncInProgress.is_retryable());
    }

    #[test]
    fn test_http_status_mapping() {
        let resp = SearchError::InvalidQuery("bad".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = SearchError::IndexUnavailable("down".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let resp = SearchError::SyncInProgress.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
