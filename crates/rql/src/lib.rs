// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub mod command;
pub mod determinism;
pub mod expression;
pub mod source;

pub use command::{
	BatchCommand, Command, CompensationProcedure, DeleteCommand, InsertCommand, InsertSource, ProcedureCommand,
	QueryExpression, SetClause, UpdateCommand,
};
pub use determinism::Determinism;
pub use expression::{Bindings, EvaluationLevel, Expression};
pub use source::{SourceIdentifier, TableId, TableReference};
