// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod lexer;
mod parser;

use std::cell::Cell;

use reifydb_policy::{CollaboratorError, PredicateCompiler};
use reifydb_rql::{
	Determinism, Expression, SourceIdentifier, TableReference,
	expression::{CallExpression, ColumnExpression},
};

use crate::{catalog::TestCatalog, fold::BUILTINS};

/// Parses, resolves and validates policy conditions against a
/// [`TestCatalog`].
pub struct TestCompiler<'a> {
	catalog: &'a TestCatalog,
	parsed: Cell<usize>,
}

impl<'a> TestCompiler<'a> {
	pub fn new(catalog: &'a TestCatalog) -> Self {
		Self {
			catalog,
			parsed: Cell::new(0),
		}
	}

	/// Number of conditions parsed so far.
	pub fn parsed(&self) -> usize {
		self.parsed.get()
	}

	fn resolve_in_place(&self, expression: &mut Expression, table: &TableReference) -> Result<(), CollaboratorError> {
		match expression {
			Expression::Column(ColumnExpression {
				source,
				name,
			}) => {
				if !source.name.is_empty() && !qualifies(&source.name, table.name()) {
					return Err(CollaboratorError::Resolve(format!(
						"unknown source {} for column {}",
						source.name, name
					)));
				}
				let Some(column) = self.catalog.find_column(table.id, name) else {
					return Err(CollaboratorError::Resolve(format!(
						"column {} not found in {}",
						name,
						table.name()
					)));
				};
				*name = column.to_string();
				*source = SourceIdentifier::new(table.name());
				Ok(())
			}
			Expression::Call(call) => {
				call.determinism = function_determinism(&call.function)?;
				for arg in &mut call.args {
					self.resolve_in_place(arg, table)?;
				}
				Ok(())
			}
			_ => {
				let mut result = Ok(());
				expression.for_each_child_mut(&mut |child| {
					if result.is_ok() {
						result = self.resolve_in_place(child, table);
					}
				});
				result
			}
		}
	}
}

/// Whether `qualifier` names `table`, either by its full name or by its last
/// segment.
fn qualifies(qualifier: &str, table: &str) -> bool {
	if qualifier.eq_ignore_ascii_case(table) {
		return true;
	}
	table.rsplit('.').next().map(|name| name.eq_ignore_ascii_case(qualifier)).unwrap_or(false)
}

fn function_determinism(function: &str) -> Result<Determinism, CollaboratorError> {
	let name = function.to_lowercase();
	if BUILTINS.contains(&name.as_str()) {
		return Ok(Determinism::Deterministic);
	}
	match name.as_str() {
		"user" => Ok(Determinism::UserDeterministic),
		"now" => Ok(Determinism::CommandDeterministic),
		"rand" => Ok(Determinism::Nondeterministic),
		_ => Err(CollaboratorError::Resolve(format!("unknown function {}", function))),
	}
}

impl PredicateCompiler for TestCompiler<'_> {
	fn parse(&self, source: &str) -> Result<Expression, CollaboratorError> {
		self.parsed.set(self.parsed.get() + 1);
		parser::parse(source)
	}

	fn resolve(&self, mut expression: Expression, table: &TableReference) -> Result<Expression, CollaboratorError> {
		self.resolve_in_place(&mut expression, table)?;
		Ok(expression)
	}

	/// Conditions must be boolean and cannot depend on statement parameters
	/// or on random values.
	fn validate(&self, expression: &Expression) -> Result<(), CollaboratorError> {
		fn check(expression: &Expression) -> Result<(), CollaboratorError> {
			match expression {
				Expression::Parameter(parameter) => Err(CollaboratorError::Validate(format!(
					"conditions cannot reference parameter ${}",
					parameter.name
				))),
				Expression::Batch(_) => {
					Err(CollaboratorError::Validate("conditions cannot contain batched values".to_string()))
				}
				Expression::Call(CallExpression {
					function,
					determinism: Determinism::Nondeterministic,
					..
				}) => Err(CollaboratorError::Validate(format!(
					"conditions cannot call nondeterministic function {}",
					function
				))),
				_ => {
					let mut result = Ok(());
					expression.for_each_child(&mut |child| {
						if result.is_ok() {
							result = check(child);
						}
					});
					result
				}
			}
		}

		if let Some(value) = expression.as_constant() {
			if value.as_bool().is_none() && !value.is_undefined() {
				return Err(CollaboratorError::Validate(format!("condition {} is not boolean", value)));
			}
		}
		check(expression)
	}
}
