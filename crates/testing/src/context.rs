// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_policy::{ActivePolicySet, PolicyContext, PolicyDef};
use reifydb_rql::Determinism;

/// A request with a fixed set of active policies.
#[derive(Debug, Clone)]
pub struct TestContext {
	policies: Option<ActivePolicySet>,
	determinism: Determinism,
}

impl TestContext {
	pub fn new(policies: impl IntoIterator<Item = PolicyDef>) -> Self {
		Self {
			policies: Some(policies.into_iter().collect()),
			determinism: Determinism::Deterministic,
		}
	}

	/// A request row security does not apply to.
	pub fn unsecured() -> Self {
		Self {
			policies: None,
			determinism: Determinism::Deterministic,
		}
	}

	/// Most restrictive determinism recorded so far.
	pub fn determinism(&self) -> Determinism {
		self.determinism
	}
}

impl PolicyContext for TestContext {
	fn active_policies(&self) -> Option<&ActivePolicySet> {
		self.policies.as_ref()
	}

	fn set_determinism(&mut self, level: Determinism) {
		self.determinism = self.determinism.restrict(level);
	}
}
