// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Gigs.ma

//! Projection of a relational listing row into the flat index document.
//!
//! `project` is a pure function: no I/O, no failure path. Missing optional
//! nested data degrades to an empty string rather than an error, so a full
//! sync can never be derailed by a single odd row.

use crate::models::listing::ListingWithJoins;
use crate::models::search::SearchDocument;

/// Project a listing (with joined category, city and provider) into the
/// document shape stored by the index.
pub fn project(joined: &ListingWithJoins) -> SearchDocument {
    let listing = &joined.listing;

    SearchDocument {
        id: listing.id.clone(),
        title: listing.title.clone(),
        slug: listing.slug.clone(),
        description: listing.description.clone(),
        base_price: listing.base_price,
        status: listing.status,
        category_id: joined.category.id.clone(),
        category_name: joined.category.name.clone(),
        city_id: joined.city.id.clone(),
        city_name: joined.city.name.clone(),
        provider_name: joined.provider.display_name.clone().unwrap_or_default(),
        // Epoch milliseconds so the index sorts numerically
        created_at_ms: listing.created_at.timestamp_millis(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::listing::{Category, City, Listing, ListingStatus, Provider};
    use chrono::{TimeZone, Utc};

    fn sample(provider_name: Option<&str>) -> ListingWithJoins {
        ListingWithJoins {
            listing: Listing {
                id: "lst_1".to_string(),
                title: "Plombier à domicile".to_string(),
                slug: "plombier-a-domicile".to_string(),
                description: "Dépannage et installation".to_string(),
                base_price: 250.0,
                status: ListingStatus::Active,
                category_id: "cat_plumbing".to_string(),
                city_id: "city_casa".to_string(),
                provider_id: "prv_9".to_string(),
                created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap(),
                updated_at: Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap(),
            },
            category: Category {
                id: "cat_plumbing".to_string(),
                name: "Plomberie".to_string(),
            },
            city: City {
                id: "city_casa".to_string(),
                name: "Casablanca".to_string(),
            },
            provider: Provider {
                id: "prv_9".to_string(),
                display_name: provider_name.map(|s| s.to_string()),
            },
        }
    }

    #[test]
    fn test_project_carries_identifier_and_denormalized_names() {
        let doc = project(&sample(Some("Hassan B.")));

        assert_eq!(doc.id, "lst_1");
        assert_eq!(doc.category_name, "Plomberie");
        assert_eq!(doc.city_name, "Casablanca");
        assert_eq!(doc.provider_name, "Hassan B.");
        assert_eq!(doc.base_price, 250.0);
        assert_eq!(doc.status, ListingStatus::Active);
    }

    #[test]
    fn test_project_missing_provider_name_degrades_to_empty() {
        let doc = project(&sample(None));
        assert_eq!(doc.provider_name, "");
    }

    #[test]
    fn test_project_converts_created_at_to_epoch_millis() {
        let doc = project(&sample(None));
        let expected = Utc
            .with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(doc.created_at_ms, expected);
    }

    #[test]
    fn test_project_total_over_statuses() {
        // Every status projects; visibility is a query-time concern
        for status in [
            ListingStatus::Draft,
            ListingStatus::Active,
            ListingStatus::Paused,
            ListingStatus::Archived,
        ] {
            let mut row = sample(None);
            row.listing.status = status;
            assert_eq!(project(&row).status, status);
        }
    }
}
