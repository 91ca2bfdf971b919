// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Gigs.ma

//! Process configuration resolved once at startup from environment variables.

use anyhow::{Context, Result};
use std::env;

/// Default number of documents per bulk-ingest batch.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default number of batch submissions in flight at once.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 2;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string for the listings store
    pub database_url: String,
    /// Base URL of the Meilisearch instance (host:port accepted)
    pub meilisearch_url: String,
    /// Optional Meilisearch API key
    pub meilisearch_api_key: Option<String>,
    /// Name of the listings index
    pub index_name: String,
    pub batch_size: usize,
    pub max_in_flight: usize,
}

impl Config {
    /// Load configuration from the environment. `DATABASE_URL` and
    /// `MEILISEARCH_URL` are required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable must be set")?;
        let meilisearch_url = env::var("MEILISEARCH_URL")
            .context("MEILISEARCH_URL environment variable must be set")?;
        let meilisearch_api_key = env::var("MEILISEARCH_API_KEY").ok();
        let index_name = env::var("SEARCH_INDEX_NAME").unwrap_or_else(|_| "listings".to_string());

        let batch_size = parse_or_default("SYNC_BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        let max_in_flight = parse_or_default("SYNC_MAX_IN_FLIGHT", DEFAULT_MAX_IN_FLIGHT)?;

        Ok(Config {
            database_url,
            meilisearch_url,
            meilisearch_api_key,
            index_name,
            batch_size,
            max_in_flight,
        })
    }
}

fn parse_or_default(key: &str, default: usize) -> Result<usize> {
    match env::var(key) {
        Ok(raw) => {
            let value: usize = raw
                .parse()
                .with_context(|| format!("{key} must be a positive integer, got '{raw}'"))?;
            if value == 0 {
                anyhow::bail!("{key} must be greater than zero");
            }
            Ok(value)
        }
        Err(_) => Ok(default),
    }
}
