// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_rql::{Bindings, Command, Expression, UpdateCommand};
use tracing::debug;

use crate::{
	Result,
	enforce::{EnforcedCommand, Enforcement, WriteEnforcer},
	error::PolicyError,
	interface::Simplified,
};

impl<'a> WriteEnforcer<'a> {
	/// Set values known while planning are folded into the filter. A value
	/// that depends on the row being updated forces the row guarded form.
	pub(crate) fn enforce_update(&self, mut update: UpdateCommand, filter: Expression) -> Result<EnforcedCommand> {
		let mut bindings = Bindings::new();
		let mut compensate = false;

		for change in &update.changes {
			if change.value.is_fully_evaluatable(true) {
				bindings.insert(&change.column, change.value.clone());
			} else if !change.value.is_fully_evaluatable(false) {
				compensate = true;
			}
		}

		// only visible rows can be updated
		update.criteria = Some(self.resolver.restrict_criteria(update.criteria.take(), &filter)?);

		let table = update.target.to_string();
		match self.fold(&filter, &bindings)? {
			Simplified::AlwaysTrue => {
				debug!(table = %table, "update satisfies row filter");
				update.constraint = None;
				Ok(EnforcedCommand::new(Command::Update(update), Enforcement::Satisfied))
			}
			_ if compensate => {
				debug!(table = %table, "update depends on row values, planning row guarded form");
				// the rewriter derives the guard from the attached constraint
				update.constraint = Some(filter);
				let mut procedure = self.resolver.rewriter.create_guarded_update(update).map_err(|source| {
					PolicyError::CompensationPlanning {
						table,
						source,
					}
				})?;
				procedure.update.constraint = None;
				Ok(EnforcedCommand::new(Command::Compensated(procedure), Enforcement::Compensated))
			}
			Simplified::AlwaysFalse | Simplified::Unknown => {
				debug!(table = %table, "update violates row filter");
				Err(PolicyError::ConstraintViolation {
					table,
				})
			}
			Simplified::Residual(residual) => {
				debug!(table = %table, constraint = %residual, "attaching row constraint to update");
				update.constraint = Some(residual);
				Ok(EnforcedCommand::new(Command::Update(update), Enforcement::Constrained))
			}
		}
	}
}
