// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_rql::{Bindings, Command, Expression, InsertCommand, InsertSource};
use tracing::debug;

use crate::{
	Result,
	enforce::{EnforcedCommand, Enforcement, WriteEnforcer},
	error::PolicyError,
	interface::Simplified,
};

impl<'a> WriteEnforcer<'a> {
	pub(crate) fn enforce_insert(&self, mut insert: InsertCommand, filter: Expression) -> Result<EnforcedCommand> {
		let table = insert.target.to_string();

		let Some(bindings) = self.insert_bindings(&insert)? else {
			debug!(table = %table, "insert from query, checking rows while executing");
			insert.constraint = Some(filter);
			return Ok(EnforcedCommand::new(Command::Insert(insert), Enforcement::Constrained));
		};

		match self.fold(&filter, &bindings)? {
			Simplified::AlwaysTrue => {
				debug!(table = %table, "insert satisfies row filter");
				insert.constraint = None;
				Ok(EnforcedCommand::new(Command::Insert(insert), Enforcement::Satisfied))
			}
			Simplified::AlwaysFalse | Simplified::Unknown => {
				debug!(table = %table, "insert violates row filter");
				Err(PolicyError::ConstraintViolation {
					table,
				})
			}
			Simplified::Residual(residual) => {
				debug!(table = %table, constraint = %residual, "attaching row constraint to insert");
				insert.constraint = Some(residual);
				Ok(EnforcedCommand::new(Command::Insert(insert), Enforcement::Constrained))
			}
		}
	}

	/// Values known while planning for every column of the target. Columns
	/// the insert does not list take their default, or undefined without one.
	///
	/// `None` for an insert from a query.
	fn insert_bindings(&self, insert: &InsertCommand) -> Result<Option<Bindings>> {
		let InsertSource::Values(values) = &insert.source else {
			return Ok(None);
		};
		let catalog = self.resolver.catalog;
		let table = insert.target.id;

		let mut result = Bindings::new();
		for column in catalog.columns(table)? {
			match insert.columns.iter().position(|c| c.eq_ignore_ascii_case(&column)) {
				Some(idx) => {
					if let Some(value) = values.get(idx) {
						if value.is_fully_evaluatable(true) {
							result.insert(&column, value.clone());
						}
					}
				}
				None => {
					let default = catalog.column_default(table, &column)?.unwrap_or_else(Expression::undefined);
					result.insert(&column, default);
				}
			}
		}
		Ok(Some(result))
	}
}
