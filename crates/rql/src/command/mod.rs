// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Write commands as handed over by the planner.
//!
//! Only the parts of a write that row security reads or rewrites are modelled
//! here: the target table, the values being written, the WHERE criteria and
//! the constraint slot the enforcer fills in.

use std::{
	fmt,
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

use crate::{
	expression::{Bindings, Expression},
	source::TableReference,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
	Insert(InsertCommand),
	Update(UpdateCommand),
	Delete(DeleteCommand),
	/// A write issued against a virtual layer; `container` is the physical
	/// statement the procedure expands to.
	Procedure(ProcedureCommand),
	Batch(BatchCommand),
	/// An update rewritten into its row-guarded form.
	Compensated(CompensationProcedure),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertCommand {
	pub target: TableReference,
	pub columns: Vec<String>,
	pub source: InsertSource,
	pub constraint: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InsertSource {
	/// One expression per listed column. A batched expression carries one
	/// value per inserted row.
	Values(Vec<Expression>),
	Query(QueryExpression),
}

/// The query feeding an `INSERT ... SELECT`. Its rows are only known while
/// executing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryExpression {
	pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCommand {
	pub target: TableReference,
	pub changes: Vec<SetClause>,
	pub criteria: Option<Expression>,
	pub constraint: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetClause {
	pub column: String,
	pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteCommand {
	pub target: TableReference,
	pub criteria: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureCommand {
	pub procedure: String,
	pub container: Box<Command>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCommand {
	pub commands: Vec<Command>,
}

/// An update executed one affected row at a time, applying the row's changes
/// only when `guard` holds for the row as it would look after the update.
/// The guard replaces the constraint of `update`, which carries none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationProcedure {
	pub update: UpdateCommand,
	pub guard: Expression,
}

impl Command {
	pub fn constraint(&self) -> Option<&Expression> {
		match self {
			Command::Insert(insert) => insert.constraint.as_ref(),
			Command::Update(update) => update.constraint.as_ref(),
			Command::Compensated(compensated) => compensated.update.constraint.as_ref(),
			Command::Delete(_) | Command::Procedure(_) | Command::Batch(_) => None,
		}
	}

	/// The physical table written by this command, if there is exactly one.
	pub fn target(&self) -> Option<&TableReference> {
		match self {
			Command::Insert(insert) => Some(&insert.target),
			Command::Update(update) => Some(&update.target),
			Command::Delete(delete) => Some(&delete.target),
			Command::Compensated(compensated) => Some(&compensated.update.target),
			Command::Procedure(procedure) => procedure.container.target(),
			Command::Batch(_) => None,
		}
	}
}

impl InsertCommand {
	pub fn values(target: TableReference, columns: Vec<String>, values: Vec<Expression>) -> Self {
		Self {
			target,
			columns,
			source: InsertSource::Values(values),
			constraint: None,
		}
	}

	pub fn query(target: TableReference, columns: Vec<String>, query: impl Into<String>) -> Self {
		Self {
			target,
			columns,
			source: InsertSource::Query(QueryExpression {
				text: query.into(),
			}),
			constraint: None,
		}
	}

	/// Column to value pairs of a value list insert; empty for an insert
	/// from a query.
	pub fn bindings(&self) -> Bindings {
		match &self.source {
			InsertSource::Values(values) => {
				self.columns.iter().zip(values.iter()).map(|(c, v)| (c.as_str(), v.clone())).collect()
			}
			InsertSource::Query(_) => Bindings::new(),
		}
	}
}

impl UpdateCommand {
	pub fn new(target: TableReference, changes: Vec<SetClause>) -> Self {
		Self {
			target,
			changes,
			criteria: None,
			constraint: None,
		}
	}

	pub fn with_criteria(mut self, criteria: Expression) -> Self {
		self.criteria = Some(criteria);
		self
	}

	pub fn bindings(&self) -> Bindings {
		self.changes.iter().map(|change| (change.column.as_str(), change.value.clone())).collect()
	}
}

impl SetClause {
	pub fn new(column: impl Into<String>, value: Expression) -> Self {
		Self {
			column: column.into(),
			value,
		}
	}
}

impl DeleteCommand {
	pub fn new(target: TableReference, criteria: Option<Expression>) -> Self {
		Self {
			target,
			criteria,
		}
	}
}

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
	for (idx, item) in items.iter().enumerate() {
		if idx > 0 {
			f.write_str(", ")?;
		}
		write!(f, "{}", item)?;
	}
	Ok(())
}

fn write_constraint(f: &mut Formatter<'_>, constraint: &Option<Expression>) -> fmt::Result {
	match constraint {
		Some(constraint) => write!(f, " CHECK {}", constraint),
		None => Ok(()),
	}
}

impl Display for SetClause {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{} = {}", self.column, self.value)
	}
}

impl Display for UpdateCommand {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "UPDATE {} SET ", self.target)?;
		write_list(f, &self.changes)?;
		if let Some(criteria) = &self.criteria {
			write!(f, " WHERE {}", criteria)?;
		}
		write_constraint(f, &self.constraint)
	}
}

impl Display for Command {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Command::Insert(insert) => {
				write!(f, "INSERT INTO {} (", insert.target)?;
				write_list(f, &insert.columns)?;
				match &insert.source {
					InsertSource::Values(values) => {
						f.write_str(") VALUES (")?;
						write_list(f, values)?;
						f.write_str(")")?;
					}
					InsertSource::Query(query) => write!(f, ") {}", query.text)?,
				}
				write_constraint(f, &insert.constraint)
			}
			Command::Update(update) => write!(f, "{}", update),
			Command::Delete(delete) => {
				write!(f, "DELETE FROM {}", delete.target)?;
				match &delete.criteria {
					Some(criteria) => write!(f, " WHERE {}", criteria),
					None => Ok(()),
				}
			}
			Command::Procedure(procedure) => {
				write!(f, "PROCEDURE {} {{ {} }}", procedure.procedure, procedure.container)
			}
			Command::Batch(batch) => {
				f.write_str("BATCH { ")?;
				for (idx, command) in batch.commands.iter().enumerate() {
					if idx > 0 {
						f.write_str("; ")?;
					}
					write!(f, "{}", command)?;
				}
				f.write_str(" }")
			}
			Command::Compensated(compensated) => {
				write!(f, "FOR EACH ROW IF {} {{ {} }}", compensated.guard, compensated.update)
			}
		}
	}
}
