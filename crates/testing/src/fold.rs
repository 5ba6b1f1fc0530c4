// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Constant folding with three-valued logic.
//!
//! Comparisons and arithmetic over undefined yield undefined. `and` is false
//! as soon as one operand is false, `or` is true as soon as one operand is
//! true; otherwise an undefined operand makes the result undefined.

use std::cmp::Ordering;

use reifydb_rql::{
	Determinism, Expression,
	expression::{BinaryExpression, CallExpression, CompoundExpression, IsUndefinedExpression, PrefixExpression, PrefixOperator},
};
use reifydb_type::Value;

#[derive(Clone, Copy)]
enum Arithmetic {
	Add,
	Sub,
	Mul,
	Div,
}

#[derive(Clone, Copy)]
enum Comparison {
	Equal,
	NotEqual,
	LessThan,
	LessThanEqual,
	GreaterThan,
	GreaterThanEqual,
}

impl Comparison {
	fn holds(self, ordering: Ordering) -> bool {
		match self {
			Comparison::Equal => ordering == Ordering::Equal,
			Comparison::NotEqual => ordering != Ordering::Equal,
			Comparison::LessThan => ordering == Ordering::Less,
			Comparison::LessThanEqual => ordering != Ordering::Greater,
			Comparison::GreaterThan => ordering == Ordering::Greater,
			Comparison::GreaterThanEqual => ordering != Ordering::Less,
		}
	}
}

/// Folds every constant sub-expression of `expression`.
pub fn fold(expression: Expression) -> Expression {
	match expression {
		Expression::Constant(_)
		| Expression::Batch(_)
		| Expression::Column(_)
		| Expression::Parameter(_)
		| Expression::Subquery(_) => expression,
		Expression::Prefix(prefix) => fold_prefix(prefix),
		Expression::Call(call) => fold_call(call),
		Expression::IsUndefined(is) => fold_is_undefined(is),
		Expression::Add(binary) => fold_arithmetic(Arithmetic::Add, binary, Expression::Add),
		Expression::Sub(binary) => fold_arithmetic(Arithmetic::Sub, binary, Expression::Sub),
		Expression::Mul(binary) => fold_arithmetic(Arithmetic::Mul, binary, Expression::Mul),
		Expression::Div(binary) => fold_arithmetic(Arithmetic::Div, binary, Expression::Div),
		Expression::Equal(binary) => fold_comparison(Comparison::Equal, binary, Expression::Equal),
		Expression::NotEqual(binary) => fold_comparison(Comparison::NotEqual, binary, Expression::NotEqual),
		Expression::LessThan(binary) => fold_comparison(Comparison::LessThan, binary, Expression::LessThan),
		Expression::LessThanEqual(binary) => {
			fold_comparison(Comparison::LessThanEqual, binary, Expression::LessThanEqual)
		}
		Expression::GreaterThan(binary) => {
			fold_comparison(Comparison::GreaterThan, binary, Expression::GreaterThan)
		}
		Expression::GreaterThanEqual(binary) => {
			fold_comparison(Comparison::GreaterThanEqual, binary, Expression::GreaterThanEqual)
		}
		Expression::And(compound) => fold_logical(compound, false),
		Expression::Or(compound) => fold_logical(compound, true),
	}
}

fn fold_prefix(prefix: PrefixExpression) -> Expression {
	let inner = fold(*prefix.expression);
	let Some(value) = inner.as_constant().cloned() else {
		return Expression::Prefix(PrefixExpression {
			operator: prefix.operator,
			expression: Box::new(inner),
		});
	};

	let result = match (prefix.operator, value) {
		(PrefixOperator::Not, Value::Boolean(b)) => Value::Boolean(!b),
		(PrefixOperator::Minus, Value::Int8(v)) => v.checked_neg().map(Value::Int8).unwrap_or(Value::Undefined),
		(PrefixOperator::Minus, Value::Float8(v)) => Value::float8(-v.value()),
		_ => Value::Undefined,
	};
	Expression::constant(result)
}

fn fold_is_undefined(is: IsUndefinedExpression) -> Expression {
	let inner = fold(*is.expression);
	match inner.as_constant() {
		Some(value) => Expression::constant(value.is_undefined() != is.negated),
		None => Expression::IsUndefined(IsUndefinedExpression {
			expression: Box::new(inner),
			negated: is.negated,
		}),
	}
}

fn fold_binary(binary: BinaryExpression) -> (Expression, Expression) {
	(fold(*binary.left), fold(*binary.right))
}

fn fold_arithmetic(
	op: Arithmetic,
	binary: BinaryExpression,
	rebuild: fn(BinaryExpression) -> Expression,
) -> Expression {
	let (left, right) = fold_binary(binary);
	match (left.as_constant(), right.as_constant()) {
		(Some(l), Some(r)) => Expression::constant(arithmetic(op, l, r)),
		_ => rebuild(Expression::binary(left, right)),
	}
}

fn arithmetic(op: Arithmetic, left: &Value, right: &Value) -> Value {
	match (left, right) {
		(Value::Int8(l), Value::Int8(r)) => {
			let result = match op {
				Arithmetic::Add => l.checked_add(*r),
				Arithmetic::Sub => l.checked_sub(*r),
				Arithmetic::Mul => l.checked_mul(*r),
				Arithmetic::Div => l.checked_div(*r),
			};
			result.map(Value::Int8).unwrap_or(Value::Undefined)
		}
		(Value::Utf8(l), Value::Utf8(r)) if matches!(op, Arithmetic::Add) => Value::Utf8(format!("{}{}", l, r)),
		_ => {
			let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) else {
				return Value::Undefined;
			};
			match op {
				Arithmetic::Add => Value::float8(l + r),
				Arithmetic::Sub => Value::float8(l - r),
				Arithmetic::Mul => Value::float8(l * r),
				Arithmetic::Div if r == 0.0 => Value::Undefined,
				Arithmetic::Div => Value::float8(l / r),
			}
		}
	}
}

fn fold_comparison(
	op: Comparison,
	binary: BinaryExpression,
	rebuild: fn(BinaryExpression) -> Expression,
) -> Expression {
	let (left, right) = fold_binary(binary);
	match (left.as_constant(), right.as_constant()) {
		(Some(l), Some(r)) => match l.compare(r) {
			Some(ordering) => Expression::constant(op.holds(ordering)),
			None => Expression::undefined(),
		},
		_ => rebuild(Expression::binary(left, right)),
	}
}

/// `short_circuit` is the value that decides the whole expression: `false`
/// for `and`, `true` for `or`.
fn fold_logical(compound: CompoundExpression, short_circuit: bool) -> Expression {
	let mut remaining = Vec::with_capacity(compound.operands.len());
	let mut undefined = false;

	let mut pending = compound.operands;
	pending.reverse();
	while let Some(operand) = pending.pop() {
		let operand = fold(operand);
		match (&operand, short_circuit) {
			(Expression::And(nested), false) | (Expression::Or(nested), true) => {
				pending.extend(nested.operands.iter().rev().cloned());
				continue;
			}
			_ => {}
		}
		match operand.as_constant() {
			Some(Value::Boolean(b)) if *b == short_circuit => return Expression::constant(short_circuit),
			Some(Value::Boolean(_)) => {}
			Some(_) => undefined = true,
			None => remaining.push(operand),
		}
	}

	if undefined {
		if remaining.is_empty() {
			return Expression::undefined();
		}
		remaining.push(Expression::undefined());
	}
	if remaining.is_empty() {
		return Expression::constant(!short_circuit);
	}
	if short_circuit {
		Expression::or(remaining)
	} else {
		Expression::and(remaining)
	}
}

fn fold_call(call: CallExpression) -> Expression {
	let args: Vec<Expression> = call.args.into_iter().map(fold).collect();

	if call.determinism == Determinism::Deterministic {
		let values: Option<Vec<Value>> = args.iter().map(|arg| arg.as_constant().cloned()).collect();
		if let Some(values) = values {
			if let Some(result) = call_builtin(&call.function, &values) {
				return Expression::constant(result);
			}
		}
	}

	Expression::Call(CallExpression {
		function: call.function,
		args,
		determinism: call.determinism,
	})
}

pub const BUILTINS: &[&str] = &["abs", "lower", "upper", "length"];

/// Deterministic builtin functions, `None` for anything else.
pub fn call_builtin(function: &str, args: &[Value]) -> Option<Value> {
	let function = function.to_lowercase();
	if !BUILTINS.contains(&function.as_str()) {
		return None;
	}
	let result = match (function.as_str(), args) {
		(_, [Value::Undefined]) => Value::Undefined,
		("abs", [Value::Int8(v)]) => v.checked_abs().map(Value::Int8).unwrap_or(Value::Undefined),
		("abs", [Value::Float8(v)]) => Value::float8(v.value().abs()),
		("lower", [Value::Utf8(v)]) => Value::Utf8(v.to_lowercase()),
		("upper", [Value::Utf8(v)]) => Value::Utf8(v.to_uppercase()),
		("length", [Value::Utf8(v)]) => Value::Int8(v.chars().count() as i64),
		_ => return None,
	};
	Some(result)
}
