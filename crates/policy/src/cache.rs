// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Cache of resolved policy predicates.
//!
//! Entries are keyed by table and policy name. Reads never block. Two requests
//! missing the same entry at once both compute it and the last insert wins;
//! both computed the same predicate, so either one is correct.

use std::sync::Arc;

use crossbeam_skiplist::SkipMap;
use reifydb_rql::{Expression, TableId};
use tracing::trace;

#[derive(Clone, Default)]
pub struct FilterCache(Arc<SkipMap<(TableId, String), Expression>>);

impl FilterCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// A copy of the cached predicate. The cached instance is never handed
	/// out.
	pub fn get(&self, table: TableId, policy: &str) -> Option<Expression> {
		self.0.get(&(table, policy.to_string())).map(|entry| entry.value().clone())
	}

	pub fn insert(&self, table: TableId, policy: &str, predicate: Expression) {
		self.0.insert((table, policy.to_string()), predicate);
	}

	/// Drops every predicate cached for `table`, e.g. when its metadata
	/// changed.
	pub fn invalidate_table(&self, table: TableId) {
		let keys: Vec<_> = self
			.0
			.range((table, String::new())..)
			.take_while(|entry| entry.key().0 == table)
			.map(|entry| entry.key().clone())
			.collect();

		trace!(table = %table, entries = keys.len(), "invalidating cached policy filters");
		for key in keys {
			self.0.remove(&key);
		}
	}

	pub fn clear(&self) {
		self.0.clear();
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl std::fmt::Debug for FilterCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FilterCache").field("entries", &self.len()).finish()
	}
}
