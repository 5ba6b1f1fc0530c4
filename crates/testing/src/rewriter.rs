// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::cell::Cell;

use reifydb_policy::{CollaboratorError, Rewriter, Simplified};
use reifydb_rql::{CompensationProcedure, Expression, UpdateCommand};
use reifydb_type::Value;

use crate::fold::fold;

/// Simplifies predicates by constant folding.
#[derive(Debug, Default)]
pub struct TestRewriter {
	reject_compensation: bool,
	guarded: Cell<usize>,
}

impl TestRewriter {
	pub fn new() -> Self {
		Self::default()
	}

	/// A rewriter that cannot produce the row guarded form of any update.
	pub fn rejecting_compensation() -> Self {
		Self {
			reject_compensation: true,
			..Self::default()
		}
	}

	/// Number of guarded updates created so far.
	pub fn guarded(&self) -> usize {
		self.guarded.get()
	}
}

impl Rewriter for TestRewriter {
	fn simplify(&self, expression: Expression) -> Result<Simplified, CollaboratorError> {
		let folded = fold(expression);
		match folded.as_constant() {
			None => Ok(Simplified::Residual(folded)),
			Some(Value::Boolean(true)) => Ok(Simplified::AlwaysTrue),
			Some(Value::Boolean(false)) => Ok(Simplified::AlwaysFalse),
			Some(Value::Undefined) => Ok(Simplified::Unknown),
			Some(value) => Err(CollaboratorError::Rewrite(format!("predicate folds to non boolean value {}", value))),
		}
	}

	/// The guard is the constraint as seen by the updated row: every changed
	/// column replaced by its new value.
	fn create_guarded_update(&self, update: UpdateCommand) -> Result<CompensationProcedure, CollaboratorError> {
		if self.reject_compensation {
			return Err(CollaboratorError::Rewrite(format!("cannot process '{}' row by row", update)));
		}
		let Some(constraint) = &update.constraint else {
			return Err(CollaboratorError::Rewrite("update has no constraint to guard".to_string()));
		};

		let guard = fold(constraint.substitute(&update.bindings()));
		self.guarded.set(self.guarded.get() + 1);
		Ok(CompensationProcedure {
			update,
			guard,
		})
	}
}
