// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! The parts of the host row security relies on but does not implement.

use reifydb_rql::{CompensationProcedure, Determinism, Expression, TableId, TableReference, UpdateCommand};
use reifydb_type::Value;

use crate::{cache::FilterCache, def::ActivePolicySet, error::CollaboratorError};

/// Result of an operation that may have to be retried later.
///
/// `Suspended` is not a failure: the caller re-invokes the same operation
/// once the data it is waiting for is available. Nothing observable happens
/// before an operation suspends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
	Ready(T),
	Suspended,
}

impl<T> Outcome<T> {
	pub fn is_suspended(&self) -> bool {
		matches!(self, Outcome::Suspended)
	}
}

/// Canonical form of a simplified predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Simplified {
	AlwaysTrue,
	AlwaysFalse,
	/// Folds to undefined for every row.
	Unknown,
	Residual(Expression),
}

impl Simplified {
	pub fn into_expression(self) -> Expression {
		match self {
			Simplified::AlwaysTrue => Expression::constant(true),
			Simplified::AlwaysFalse => Expression::constant(false),
			Simplified::Unknown => Expression::constant(Value::Undefined),
			Simplified::Residual(expression) => expression,
		}
	}
}

/// Table metadata.
pub trait PolicyCatalog {
	/// Canonical, fully qualified name of the table.
	fn full_name(&self, table: TableId) -> Result<String, CollaboratorError>;

	/// Names of all columns of the table, in declaration order.
	fn columns(&self, table: TableId) -> Result<Vec<String>, CollaboratorError>;

	/// Declared default of a column, if it has one.
	fn column_default(&self, table: TableId, column: &str) -> Result<Option<Expression>, CollaboratorError>;

	/// Cache of resolved policy predicates, living as long as the table
	/// metadata.
	fn filter_cache(&self) -> &FilterCache;
}

/// Turns a policy condition into a resolved predicate.
pub trait PredicateCompiler {
	fn parse(&self, source: &str) -> Result<Expression, CollaboratorError>;

	/// Binds column references of `expression` to `table`.
	fn resolve(&self, expression: Expression, table: &TableReference) -> Result<Expression, CollaboratorError>;

	fn validate(&self, expression: &Expression) -> Result<(), CollaboratorError>;
}

/// The request row security runs for.
pub trait PolicyContext {
	/// `None` when row security does not apply to the request.
	fn active_policies(&self) -> Option<&ActivePolicySet>;

	/// Records that the plan depends on something only stable at `level`.
	fn set_determinism(&mut self, level: Determinism);
}

pub trait Evaluator {
	/// Evaluates a boolean predicate. Undefined counts as `false`.
	fn evaluate(&mut self, predicate: &Expression) -> Result<Outcome<bool>, CollaboratorError>;
}

pub trait Rewriter {
	fn simplify(&self, expression: Expression) -> Result<Simplified, CollaboratorError>;

	/// Turns `update`, with its constraint attached, into a form that checks
	/// the constraint for every affected row before changing it.
	fn create_guarded_update(&self, update: UpdateCommand) -> Result<CompensationProcedure, CollaboratorError>;
}
