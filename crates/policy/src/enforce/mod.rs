// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Folds the row filter of the written table into write commands.
//!
//! Whatever can be decided while planning is decided here: writes that can
//! never satisfy the filter are rejected, writes that always satisfy it carry
//! no constraint. Everything else gets a constraint that
//! [`check_constraints`](crate::check_constraints) verifies while executing.

mod insert;
mod update;

use reifydb_rql::{BatchCommand, Bindings, Command, DeleteCommand, Expression, ProcedureCommand};
use tracing::{debug, instrument};

use crate::{
	Result,
	filter::FilterResolver,
	interface::{PolicyContext, Simplified},
};

/// What the enforcer did to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enforcement {
	/// No active policy restricts the written table.
	Unrestricted,
	/// Every row the command writes satisfies the filter; no check needed.
	Satisfied,
	/// A constraint was attached and is checked while executing.
	Constrained,
	/// The update was replaced by its row guarded form.
	Compensated,
	/// The filter was merged into the command's criteria.
	Filtered,
	/// The command writes through a procedure; only the container statement
	/// was restricted.
	Procedural,
	Batched(Vec<Enforcement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnforcedCommand {
	pub command: Command,
	pub enforcement: Enforcement,
}

impl EnforcedCommand {
	pub fn new(command: Command, enforcement: Enforcement) -> Self {
		Self {
			command,
			enforcement,
		}
	}

	fn unrestricted(command: Command) -> Self {
		Self::new(command, Enforcement::Unrestricted)
	}
}

pub struct WriteEnforcer<'a> {
	resolver: FilterResolver<'a>,
}

impl<'a> WriteEnforcer<'a> {
	pub fn new(resolver: FilterResolver<'a>) -> Self {
		Self {
			resolver,
		}
	}

	pub fn resolver(&self) -> &FilterResolver<'a> {
		&self.resolver
	}

	#[instrument(name = "policy::enforce::enforce", level = "debug", skip_all)]
	pub fn enforce(&self, command: Command, ctx: &mut dyn PolicyContext) -> Result<EnforcedCommand> {
		match command {
			Command::Insert(insert) => match self.resolver.effective_filter(&insert.target, ctx)? {
				Some(filter) => self.enforce_insert(insert, filter),
				None => Ok(EnforcedCommand::unrestricted(Command::Insert(insert))),
			},
			Command::Update(update) => match self.resolver.effective_filter(&update.target, ctx)? {
				Some(filter) => self.enforce_update(update, filter),
				None => Ok(EnforcedCommand::unrestricted(Command::Update(update))),
			},
			Command::Delete(delete) => match self.resolver.effective_filter(&delete.target, ctx)? {
				Some(filter) => self.enforce_delete(delete, filter),
				None => Ok(EnforcedCommand::unrestricted(Command::Delete(delete))),
			},
			Command::Procedure(procedure) => self.enforce_procedure(procedure, ctx),
			Command::Batch(batch) => self.enforce_batch(batch, ctx),
			Command::Compensated(compensated) => {
				Ok(EnforcedCommand::new(Command::Compensated(compensated), Enforcement::Compensated))
			}
		}
	}

	fn enforce_delete(&self, mut delete: DeleteCommand, filter: Expression) -> Result<EnforcedCommand> {
		delete.criteria = Some(self.resolver.restrict_criteria(delete.criteria.take(), &filter)?);
		debug!(table = %delete.target, "restricted delete to visible rows");
		Ok(EnforcedCommand::new(Command::Delete(delete), Enforcement::Filtered))
	}

	/// The filter is applied to the physical statement the procedure expands
	/// to: filtered statements only touch visible rows, an insert gets the
	/// filter as its constraint and is checked while executing. Set values
	/// are not folded into the filter.
	fn enforce_procedure(&self, mut procedure: ProcedureCommand, ctx: &mut dyn PolicyContext) -> Result<EnforcedCommand> {
		let Some(target) = procedure.container.target().cloned() else {
			return Ok(EnforcedCommand::unrestricted(Command::Procedure(procedure)));
		};
		let Some(filter) = self.resolver.effective_filter(&target, ctx)? else {
			return Ok(EnforcedCommand::unrestricted(Command::Procedure(procedure)));
		};

		self.restrict_container(procedure.container.as_mut(), &filter)?;
		debug!(procedure = %procedure.procedure, table = %target, "restricted procedure container");
		Ok(EnforcedCommand::new(Command::Procedure(procedure), Enforcement::Procedural))
	}

	fn restrict_container(&self, container: &mut Command, filter: &Expression) -> Result<()> {
		match container {
			Command::Update(update) => {
				update.criteria = Some(self.resolver.restrict_criteria(update.criteria.take(), filter)?);
			}
			Command::Delete(delete) => {
				delete.criteria = Some(self.resolver.restrict_criteria(delete.criteria.take(), filter)?);
			}
			Command::Compensated(compensated) => {
				let update = &mut compensated.update;
				update.criteria = Some(self.resolver.restrict_criteria(update.criteria.take(), filter)?);
			}
			Command::Insert(insert) => insert.constraint = Some(filter.clone()),
			Command::Procedure(procedure) => self.restrict_container(procedure.container.as_mut(), filter)?,
			// no single target, the procedure is returned unrestricted
			Command::Batch(_) => {}
		}
		Ok(())
	}

	fn enforce_batch(&self, batch: BatchCommand, ctx: &mut dyn PolicyContext) -> Result<EnforcedCommand> {
		let mut commands = Vec::with_capacity(batch.commands.len());
		let mut enforcements = Vec::with_capacity(batch.commands.len());

		for command in batch.commands {
			let enforced = self.enforce(command, ctx)?;
			commands.push(enforced.command);
			enforcements.push(enforced.enforcement);
		}

		Ok(EnforcedCommand::new(
			Command::Batch(BatchCommand {
				commands,
			}),
			Enforcement::Batched(enforcements),
		))
	}

	/// Substitutes `bindings` into a copy of `filter` and simplifies it.
	fn fold(&self, filter: &Expression, bindings: &Bindings) -> Result<Simplified> {
		Ok(self.resolver.rewriter.simplify(filter.substitute(bindings))?)
	}
}
