// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Gigs.ma

use serde::{Deserialize, Serialize};

/// Response for the version endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    /// Service name
    pub service: String,
    /// Version in semver format (e.g., "0.1.0")
    pub version: String,
}
