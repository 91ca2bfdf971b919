// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Gigs.ma

//! Source-of-truth entities read from the relational store. The search
//! subsystem never writes these; it only projects them into the index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a listing. Stored lowercase in the `listings.status`
/// column and mirrored verbatim into the search document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Draft,
    Active,
    Paused,
    Archived,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Active => "active",
            ListingStatus::Paused => "paused",
            ListingStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ListingStatus::Draft),
            "active" => Ok(ListingStatus::Active),
            "paused" => Ok(ListingStatus::Paused),
            "archived" => Ok(ListingStatus::Archived),
            other => Err(format!("unknown listing status: {other}")),
        }
    }
}

/// A service offering published by a provider; the searchable entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub base_price: f64,
    pub status: ListingStatus,
    pub category_id: String,
    pub city_id: String,
    pub provider_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub display_name: Option<String>,
}

/// One row of the bulk read: a listing with its joined category, city and
/// provider. This is the input shape of the document projector.
#[derive(Debug, Clone)]
pub struct ListingWithJoins {
    pub listing: Listing,
    pub category: Category,
    pub city: City,
    pub provider: Provider,
}

impl FromRow<'_, PgRow> for ListingWithJoins {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let status_raw: String = row.try_get("status")?;
        let status = ListingStatus::from_str(&status_raw).map_err(|e| {
            sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: e.into(),
            }
        })?;

        Ok(ListingWithJoins {
            listing: Listing {
                id: row.try_get("id")?,
                title: row.try_get("title")?,
                slug: row.try_get("slug")?,
                description: row.try_get("description")?,
                base_price: row.try_get("base_price")?,
                status,
                category_id: row.try_get("category_id")?,
                city_id: row.try_get("city_id")?,
                provider_id: row.try_get("provider_id")?,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            },
            category: Category {
                id: row.try_get("category_id")?,
                name: row.try_get("category_name")?,
            },
            city: City {
                id: row.try_get("city_id")?,
                name: row.try_get("city_name")?,
            },
            provider: Provider {
                id: row.try_get("provider_id")?,
                display_name: row.try_get("provider_name")?,
            },
        })
    }
}
