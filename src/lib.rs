// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Gigs.ma

//! Gigs.ma search service: keeps the Meilisearch listings index in sync
//! with the relational store and serves translated search queries.

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
