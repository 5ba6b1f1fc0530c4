// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;
use reifydb_policy::{CollaboratorError, Evaluator, Outcome};
use reifydb_rql::{Expression, expression::ColumnExpression};
use reifydb_type::Value;

use crate::fold::fold;

/// Evaluates predicates against parameters and an optional current row.
///
/// Can be told to suspend a number of times before it evaluates anything.
#[derive(Debug, Default)]
pub struct TestEvaluator {
	parameters: IndexMap<String, Value>,
	row: IndexMap<String, Value>,
	user: Option<String>,
	suspensions: usize,
	evaluated: usize,
}

impl TestEvaluator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_parameter(mut self, name: &str, value: impl Into<Value>) -> Self {
		self.parameters.insert(name.to_string(), value.into());
		self
	}

	pub fn with_user(mut self, user: &str) -> Self {
		self.user = Some(user.to_string());
		self
	}

	/// Suspends the next `times` evaluations.
	pub fn suspending(mut self, times: usize) -> Self {
		self.suspensions = times;
		self
	}

	/// Sets the row unbound columns are read from.
	pub fn set_row<'c>(&mut self, row: impl IntoIterator<Item = (&'c str, Value)>) {
		self.row = row.into_iter().map(|(column, value)| (column.to_lowercase(), value)).collect();
	}

	/// Number of predicates evaluated, suspensions excluded.
	pub fn evaluated(&self) -> usize {
		self.evaluated
	}

	fn bind(&self, expression: &mut Expression) -> Result<(), CollaboratorError> {
		let value = match expression {
			Expression::Column(ColumnExpression {
				source,
				name,
			}) => self.row.get(&name.to_lowercase()).cloned().ok_or_else(|| {
				CollaboratorError::Evaluate(format!("no value for column {}.{}", source, name))
			})?,
			Expression::Parameter(parameter) => self.parameters.get(&parameter.name).cloned().ok_or_else(|| {
				CollaboratorError::Evaluate(format!("no value for parameter ${}", parameter.name))
			})?,
			Expression::Call(call) if call.function.eq_ignore_ascii_case("user") => {
				self.user.clone().map(Value::Utf8).unwrap_or(Value::Undefined)
			}
			Expression::Batch(_) => {
				return Err(CollaboratorError::Evaluate("batched value outside of a batch".to_string()));
			}
			Expression::Subquery(subquery) => {
				return Err(CollaboratorError::Evaluate(format!("cannot evaluate subquery {}", subquery.query)));
			}
			_ => {
				let mut result = Ok(());
				expression.for_each_child_mut(&mut |child| {
					if result.is_ok() {
						result = self.bind(child);
					}
				});
				return result;
			}
		};
		*expression = Expression::constant(value);
		Ok(())
	}
}

impl Evaluator for TestEvaluator {
	fn evaluate(&mut self, predicate: &Expression) -> Result<Outcome<bool>, CollaboratorError> {
		if self.suspensions > 0 {
			self.suspensions -= 1;
			return Ok(Outcome::Suspended);
		}
		self.evaluated += 1;

		let mut bound = predicate.clone();
		self.bind(&mut bound)?;
		match fold(bound) {
			Expression::Constant(constant) => match constant.value {
				Value::Boolean(result) => Ok(Outcome::Ready(result)),
				Value::Undefined => Ok(Outcome::Ready(false)),
				other => Err(CollaboratorError::Evaluate(format!("{} is not a boolean", other))),
			},
			other => Err(CollaboratorError::Evaluate(format!("cannot evaluate {}", other))),
		}
	}
}
