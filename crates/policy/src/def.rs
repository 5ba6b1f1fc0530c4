// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A named bundle of table scoped row permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDef {
	pub name: String,
	/// Keyed by the full name of the table, e.g. `sales.orders`.
	#[serde(default)]
	pub permissions: IndexMap<String, PermissionDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDef {
	/// Predicate source restricting the rows of the table. `None` leaves the
	/// table unrestricted by this policy.
	#[serde(default)]
	pub condition: Option<String>,
}

impl PolicyDef {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			permissions: IndexMap::new(),
		}
	}

	pub fn with_condition(mut self, table: impl Into<String>, condition: impl Into<String>) -> Self {
		self.permissions.insert(
			table.into(),
			PermissionDef {
				condition: Some(condition.into()),
			},
		);
		self
	}

	pub fn with_permission(mut self, table: impl Into<String>, permission: PermissionDef) -> Self {
		self.permissions.insert(table.into(), permission);
		self
	}

	/// The permission for `table`; table names compare case-insensitively.
	pub fn permission(&self, table: &str) -> Option<&PermissionDef> {
		if let Some(permission) = self.permissions.get(table) {
			return Some(permission);
		}
		self.permissions.iter().find(|(name, _)| name.eq_ignore_ascii_case(table)).map(|(_, p)| p)
	}

	pub fn condition(&self, table: &str) -> Option<&str> {
		self.permission(table).and_then(|p| p.condition.as_deref())
	}
}

/// The policies in effect for one request, keyed by policy name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivePolicySet {
	policies: IndexMap<String, PolicyDef>,
}

impl ActivePolicySet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, policy: PolicyDef) -> Option<PolicyDef> {
		self.policies.insert(policy.name.clone(), policy)
	}

	pub fn get(&self, name: &str) -> Option<&PolicyDef> {
		self.policies.get(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = &PolicyDef> {
		self.policies.values()
	}

	pub fn len(&self) -> usize {
		self.policies.len()
	}

	pub fn is_empty(&self) -> bool {
		self.policies.is_empty()
	}
}

impl FromIterator<PolicyDef> for ActivePolicySet {
	fn from_iter<I: IntoIterator<Item = PolicyDef>>(iter: I) -> Self {
		let mut result = ActivePolicySet::new();
		for policy in iter {
			result.insert(policy);
		}
		result
	}
}
