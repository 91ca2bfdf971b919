// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Gigs.ma

pub mod listing;
pub mod search;
pub mod version;
