// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde::{Deserialize, Serialize};

/// Configuration for row level security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowSecurityConfig {
	/// When disabled, no table is restricted regardless of the active
	/// policies.
	///
	/// Default: true
	pub enabled: bool,
	/// Keep resolved policy predicates in the catalog's filter cache.
	///
	/// Default: true
	pub cache_filters: bool,
}

impl Default for RowSecurityConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			cache_filters: true,
		}
	}
}

impl RowSecurityConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn enabled(mut self, enabled: bool) -> Self {
		self.enabled = enabled;
		self
	}

	pub fn cache_filters(mut self, cache_filters: bool) -> Self {
		self.cache_filters = cache_filters;
		self
	}
}
