// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Gigs.ma

pub mod db;
pub mod projector;
pub mod retry;
pub mod search;
pub mod sync;
