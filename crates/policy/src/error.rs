// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use thiserror::Error;

/// Failure reported by one of the collaborators row security builds on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
	#[error("parse error: {0}")]
	Parse(String),

	#[error("resolve error: {0}")]
	Resolve(String),

	#[error("validation error: {0}")]
	Validate(String),

	#[error("evaluation error: {0}")]
	Evaluate(String),

	#[error("metadata error: {0}")]
	Metadata(String),

	#[error("rewrite error: {0}")]
	Rewrite(String),
}

#[derive(Debug, Error)]
pub enum PolicyError {
	/// The condition a policy declares for a table cannot be parsed, resolved
	/// against the table or fails validation. Fatal for the current plan.
	#[error("row security policy '{policy}' is invalid for table '{table}': {source}")]
	PolicyDefinition {
		policy: String,
		table: String,
		#[source]
		source: CollaboratorError,
	},

	/// A write is rejected by the row security policies, either while
	/// planning or by a runtime check.
	#[error("write to table '{table}' violates the active row security policies")]
	ConstraintViolation {
		table: String,
	},

	#[error("cannot plan the row guarded form of the update on table '{table}': {source}")]
	CompensationPlanning {
		table: String,
		#[source]
		source: CollaboratorError,
	},

	#[error(transparent)]
	Collaborator(#[from] CollaboratorError),

	#[error("batched values written to table '{table}' differ in length: expected {expected} rows, found {actual}")]
	BatchSizeMismatch {
		table: String,
		expected: usize,
		actual: usize,
	},
}

impl PolicyError {
	/// Stable diagnostic code of this error.
	pub fn code(&self) -> &'static str {
		match self {
			PolicyError::PolicyDefinition {
				..
			} => "RLS_001",
			PolicyError::ConstraintViolation {
				..
			} => "RLS_002",
			PolicyError::CompensationPlanning {
				..
			} => "RLS_003",
			PolicyError::Collaborator(_) => "RLS_004",
			PolicyError::BatchSizeMismatch {
				..
			} => "RLS_005",
		}
	}
}
