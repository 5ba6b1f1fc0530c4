// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Runtime check of the constraints attached while planning.

use reifydb_rql::{Bindings, Command, Expression, TableReference};
use tracing::{debug, instrument, trace};

use crate::{
	Result,
	error::PolicyError,
	interface::{Evaluator, Outcome},
};

/// Checks the constraint of `command` against the values it writes.
///
/// A batched value binds one value per row; the constraint is checked for
/// each row and the first failing row rejects the whole command. On
/// `Outcome::Suspended` the caller retries the whole check later; nothing is
/// carried over from the suspended attempt.
#[instrument(name = "policy::validate::check_constraints", level = "trace", skip_all)]
pub fn check_constraints(command: &Command, evaluator: &mut dyn Evaluator) -> Result<Outcome<()>> {
	let (target, constraint, bindings) = match command {
		Command::Batch(batch) => {
			for command in &batch.commands {
				if check_constraints(command, evaluator)?.is_suspended() {
					return Ok(Outcome::Suspended);
				}
			}
			return Ok(Outcome::Ready(()));
		}
		Command::Procedure(procedure) => return check_constraints(&procedure.container, evaluator),
		Command::Update(update) => (&update.target, update.constraint.as_ref(), update.bindings()),
		Command::Insert(insert) => (&insert.target, insert.constraint.as_ref(), insert.bindings()),
		// the guarded form checks each row itself
		Command::Delete(_) | Command::Compensated(_) => return Ok(Outcome::Ready(())),
	};

	let Some(constraint) = constraint else {
		return Ok(Outcome::Ready(()));
	};

	let Some(rows) = batch_size(target, &bindings)? else {
		return evaluate_constraint(target, constraint, &bindings, evaluator);
	};

	trace!(table = %target, rows, "checking batched constraint");
	for row in 0..rows {
		let row_bindings = bindings_for_row(&bindings, row);
		if evaluate_constraint(target, constraint, &row_bindings, evaluator)?.is_suspended() {
			return Ok(Outcome::Suspended);
		}
	}
	Ok(Outcome::Ready(()))
}

/// Number of rows of the batched values, `None` when no value is batched.
fn batch_size(target: &TableReference, bindings: &Bindings) -> Result<Option<usize>> {
	let mut result = None;
	for (_, value) in bindings.iter() {
		let Expression::Batch(batch) = value else {
			continue;
		};
		match result {
			None => result = Some(batch.values.len()),
			Some(expected) if expected != batch.values.len() => {
				return Err(PolicyError::BatchSizeMismatch {
					table: target.to_string(),
					expected,
					actual: batch.values.len(),
				});
			}
			Some(_) => {}
		}
	}
	Ok(result)
}

fn bindings_for_row(bindings: &Bindings, row: usize) -> Bindings {
	bindings.iter()
		.map(|(column, value)| match value {
			Expression::Batch(batch) => (column, Expression::constant(batch.values[row].clone())),
			scalar => (column, scalar.clone()),
		})
		.collect()
}

fn evaluate_constraint(
	target: &TableReference,
	constraint: &Expression,
	bindings: &Bindings,
	evaluator: &mut dyn Evaluator,
) -> Result<Outcome<()>> {
	let predicate = constraint.substitute(bindings);
	match evaluator.evaluate(&predicate)? {
		Outcome::Ready(true) => Ok(Outcome::Ready(())),
		Outcome::Ready(false) => {
			debug!(table = %target, "row constraint violated");
			Err(PolicyError::ConstraintViolation {
				table: target.to_string(),
			})
		}
		Outcome::Suspended => Ok(Outcome::Suspended),
	}
}
