// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Gigs.ma

//! Read-only access to the relational listings store.
//!
//! Sync never mutates the source of truth; it only reads listing rows with
//! their joined category, city and provider. Reads are keyset-paginated on
//! the listing id so a sync run's memory use is bounded by the batch size,
//! not the catalog size.

use crate::error::SearchError;
use crate::models::listing::ListingWithJoins;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const LISTING_PAGE_SQL: &str = "\
    SELECT l.id, l.title, l.slug, l.description, l.base_price, l.status,
           l.category_id, c.name AS category_name,
           l.city_id, ci.name AS city_name,
           l.provider_id, p.display_name AS provider_name,
           l.created_at, l.updated_at
    FROM listings l
    JOIN categories c ON c.id = l.category_id
    JOIN cities ci ON ci.id = l.city_id
    JOIN providers p ON p.id = l.provider_id
    WHERE ($1::text IS NULL OR l.id > $1)
    ORDER BY l.id
    LIMIT $2";

const UPDATED_PAGE_SQL: &str = "\
    SELECT l.id, l.title, l.slug, l.description, l.base_price, l.status,
           l.category_id, c.name AS category_name,
           l.city_id, ci.name AS city_name,
           l.provider_id, p.display_name AS provider_name,
           l.created_at, l.updated_at
    FROM listings l
    JOIN categories c ON c.id = l.category_id
    JOIN cities ci ON ci.id = l.city_id
    JOIN providers p ON p.id = l.provider_id
    WHERE l.updated_at > $1
      AND ($2::text IS NULL OR l.id > $2)
    ORDER BY l.id
    LIMIT $3";

/// Postgres client for reading listings with their joins
#[derive(Clone)]
pub struct ListingStore {
    pool: PgPool,
}

impl ListingStore {
    /// Connect a small pool to the listings database
    pub async fn connect(database_url: &str) -> Result<Self, SearchError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests)
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the next page of listings ordered by id, starting strictly
    /// after `after_id` (or from the beginning when `None`).
    pub async fn fetch_page(
        &self,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ListingWithJoins>, SearchError> {
        let rows = sqlx::query_as::<_, ListingWithJoins>(LISTING_PAGE_SQL)
            .bind(after_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Incremental variant: same page shape, restricted to listings updated
    /// after the watermark.
    pub async fn fetch_updated_page(
        &self,
        since: DateTime<Utc>,
        after_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ListingWithJoins>, SearchError> {
        let rows = sqlx::query_as::<_, ListingWithJoins>(UPDATED_PAGE_SQL)
            .bind(since)
            .bind(after_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
