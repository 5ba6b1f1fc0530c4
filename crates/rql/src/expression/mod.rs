// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod evaluable;
mod substitute;

use std::{
	fmt,
	fmt::{Display, Formatter},
};

pub use evaluable::EvaluationLevel;
use reifydb_type::Value;
use serde::{Deserialize, Serialize};
pub use substitute::Bindings;

use crate::{determinism::Determinism, source::SourceIdentifier};

/// A boolean or scalar expression tree.
///
/// Row security predicates are expressions of this type. Expressions are
/// plain owned trees: `clone` is a deep structural copy, so a clone can be
/// substituted or renamed without affecting the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
	Constant(ConstantExpression),

	Batch(BatchExpression),

	Column(ColumnExpression),

	Parameter(ParameterExpression),

	Call(CallExpression),

	Subquery(SubqueryExpression),

	Prefix(PrefixExpression),

	Add(BinaryExpression),

	Sub(BinaryExpression),

	Mul(BinaryExpression),

	Div(BinaryExpression),

	Equal(BinaryExpression),

	NotEqual(BinaryExpression),

	LessThan(BinaryExpression),

	LessThanEqual(BinaryExpression),

	GreaterThan(BinaryExpression),

	GreaterThanEqual(BinaryExpression),

	IsUndefined(IsUndefinedExpression),

	And(CompoundExpression),

	Or(CompoundExpression),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantExpression {
	pub value: Value,
}

/// One value per row of a bulk operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchExpression {
	pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnExpression {
	pub source: SourceIdentifier,
	pub name: String,
}

/// A value bound by the executor, e.g. a prepared statement parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterExpression {
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpression {
	pub function: String,
	pub args: Vec<Expression>,
	pub determinism: Determinism,
}

/// A scalar subquery, possibly correlated with the row being processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubqueryExpression {
	pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefixOperator {
	Minus,
	Not,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixExpression {
	pub operator: PrefixOperator,
	pub expression: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpression {
	pub left: Box<Expression>,
	pub right: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsUndefinedExpression {
	pub expression: Box<Expression>,
	pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundExpression {
	pub operands: Vec<Expression>,
}

impl Expression {
	pub fn constant(value: impl Into<Value>) -> Self {
		Expression::Constant(ConstantExpression {
			value: value.into(),
		})
	}

	pub fn undefined() -> Self {
		Expression::Constant(ConstantExpression {
			value: Value::Undefined,
		})
	}

	pub fn batch(values: impl IntoIterator<Item = Value>) -> Self {
		Expression::Batch(BatchExpression {
			values: values.into_iter().collect(),
		})
	}

	pub fn column(source: SourceIdentifier, name: impl Into<String>) -> Self {
		Expression::Column(ColumnExpression {
			source,
			name: name.into(),
		})
	}

	pub fn parameter(name: impl Into<String>) -> Self {
		Expression::Parameter(ParameterExpression {
			name: name.into(),
		})
	}

	pub fn call(function: impl Into<String>, args: Vec<Expression>, determinism: Determinism) -> Self {
		Expression::Call(CallExpression {
			function: function.into(),
			args,
			determinism,
		})
	}

	pub fn binary(left: Expression, right: Expression) -> BinaryExpression {
		BinaryExpression {
			left: Box::new(left),
			right: Box::new(right),
		}
	}

	pub fn not(expression: Expression) -> Self {
		Expression::Prefix(PrefixExpression {
			operator: PrefixOperator::Not,
			expression: Box::new(expression),
		})
	}

	/// Conjunction of all operands; a single operand is returned as is.
	pub fn and(operands: Vec<Expression>) -> Self {
		Self::compound(operands, Expression::And)
	}

	/// Disjunction of all operands; a single operand is returned as is.
	pub fn or(operands: Vec<Expression>) -> Self {
		Self::compound(operands, Expression::Or)
	}

	fn compound(mut operands: Vec<Expression>, ctor: fn(CompoundExpression) -> Expression) -> Self {
		if operands.len() == 1 {
			return operands.remove(0);
		}
		ctor(CompoundExpression {
			operands,
		})
	}

	/// Returns the constant value if this expression is a constant.
	pub fn as_constant(&self) -> Option<&Value> {
		match self {
			Expression::Constant(ConstantExpression {
				value,
			}) => Some(value),
			_ => None,
		}
	}

	pub fn is_true(&self) -> bool {
		matches!(self.as_constant(), Some(Value::Boolean(true)))
	}

	pub fn is_false(&self) -> bool {
		matches!(self.as_constant(), Some(Value::Boolean(false)))
	}

	/// Calls `f` for every direct child of this expression.
	pub fn for_each_child<'a>(&'a self, f: &mut dyn FnMut(&'a Expression)) {
		match self {
			Expression::Constant(_)
			| Expression::Batch(_)
			| Expression::Column(_)
			| Expression::Parameter(_)
			| Expression::Subquery(_) => {}
			Expression::Call(call) => call.args.iter().for_each(|arg| f(arg)),
			Expression::Prefix(prefix) => f(prefix.expression.as_ref()),
			Expression::IsUndefined(is) => f(is.expression.as_ref()),
			Expression::Add(binary)
			| Expression::Sub(binary)
			| Expression::Mul(binary)
			| Expression::Div(binary)
			| Expression::Equal(binary)
			| Expression::NotEqual(binary)
			| Expression::LessThan(binary)
			| Expression::LessThanEqual(binary)
			| Expression::GreaterThan(binary)
			| Expression::GreaterThanEqual(binary) => {
				f(binary.left.as_ref());
				f(binary.right.as_ref());
			}
			Expression::And(compound) | Expression::Or(compound) => {
				compound.operands.iter().for_each(|operand| f(operand))
			}
		}
	}

	/// Calls `f` for every direct child of this expression, mutably.
	pub fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut Expression)) {
		match self {
			Expression::Constant(_)
			| Expression::Batch(_)
			| Expression::Column(_)
			| Expression::Parameter(_)
			| Expression::Subquery(_) => {}
			Expression::Call(call) => call.args.iter_mut().for_each(|arg| f(arg)),
			Expression::Prefix(prefix) => f(prefix.expression.as_mut()),
			Expression::IsUndefined(is) => f(is.expression.as_mut()),
			Expression::Add(binary)
			| Expression::Sub(binary)
			| Expression::Mul(binary)
			| Expression::Div(binary)
			| Expression::Equal(binary)
			| Expression::NotEqual(binary)
			| Expression::LessThan(binary)
			| Expression::LessThanEqual(binary)
			| Expression::GreaterThan(binary)
			| Expression::GreaterThanEqual(binary) => {
				f(binary.left.as_mut());
				f(binary.right.as_mut());
			}
			Expression::And(compound) | Expression::Or(compound) => {
				compound.operands.iter_mut().for_each(|operand| f(operand))
			}
		}
	}

	/// All column references of this expression, in pre-order.
	pub fn columns(&self) -> Vec<&ColumnExpression> {
		fn collect<'a>(expr: &'a Expression, out: &mut Vec<&'a ColumnExpression>) {
			if let Expression::Column(column) = expr {
				out.push(column);
				return;
			}
			expr.for_each_child(&mut |child| collect(child, out));
		}

		let mut result = Vec::new();
		collect(self, &mut result);
		result
	}
}

impl Display for Expression {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Expression::Constant(ConstantExpression {
				value,
			}) => write!(f, "{}", value),
			Expression::Batch(BatchExpression {
				values,
			}) => {
				let items = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
				write!(f, "[{}]", items)
			}
			Expression::Column(ColumnExpression {
				source,
				name,
			}) => write!(f, "{}.{}", source, name),
			Expression::Parameter(ParameterExpression {
				name,
			}) => write!(f, "${}", name),
			Expression::Call(CallExpression {
				function,
				args,
				..
			}) => {
				let args = args.iter().map(|arg| arg.to_string()).collect::<Vec<_>>().join(", ");
				write!(f, "{}({})", function, args)
			}
			Expression::Subquery(SubqueryExpression {
				query,
			}) => write!(f, "({})", query),
			Expression::Prefix(PrefixExpression {
				operator: PrefixOperator::Minus,
				expression,
			}) => write!(f, "(-{})", expression),
			Expression::Prefix(PrefixExpression {
				operator: PrefixOperator::Not,
				expression,
			}) => write!(f, "(not {})", expression),
			Expression::Add(BinaryExpression {
				left,
				right,
			}) => write!(f, "({} + {})", left, right),
			Expression::Sub(BinaryExpression {
				left,
				right,
			}) => write!(f, "({} - {})", left, right),
			Expression::Mul(BinaryExpression {
				left,
				right,
			}) => write!(f, "({} * {})", left, right),
			Expression::Div(BinaryExpression {
				left,
				right,
			}) => write!(f, "({} / {})", left, right),
			Expression::Equal(BinaryExpression {
				left,
				right,
			}) => write!(f, "({} == {})", left, right),
			Expression::NotEqual(BinaryExpression {
				left,
				right,
			}) => write!(f, "({} != {})", left, right),
			Expression::LessThan(BinaryExpression {
				left,
				right,
			}) => write!(f, "({} < {})", left, right),
			Expression::LessThanEqual(BinaryExpression {
				left,
				right,
			}) => write!(f, "({} <= {})", left, right),
			Expression::GreaterThan(BinaryExpression {
				left,
				right,
			}) => write!(f, "({} > {})", left, right),
			Expression::GreaterThanEqual(BinaryExpression {
				left,
				right,
			}) => write!(f, "({} >= {})", left, right),
			Expression::IsUndefined(IsUndefinedExpression {
				expression,
				negated: false,
			}) => write!(f, "({} is undefined)", expression),
			Expression::IsUndefined(IsUndefinedExpression {
				expression,
				negated: true,
			}) => write!(f, "({} is not undefined)", expression),
			Expression::And(CompoundExpression {
				operands,
			}) => {
				let items = operands.iter().map(|o| o.to_string()).collect::<Vec<_>>().join(" and ");
				write!(f, "({})", items)
			}
			Expression::Or(CompoundExpression {
				operands,
			}) => {
				let items = operands.iter().map(|o| o.to_string()).collect::<Vec<_>>().join(" or ");
				write!(f, "({})", items)
			}
		}
	}
}
