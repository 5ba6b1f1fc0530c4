// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::{
	cmp::Ordering,
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

mod ordered_f64;
mod r#type;

pub use ordered_f64::OrderedF64;
pub use r#type::Type;

/// A RQL value, represented as a native Rust type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
	/// Value is not defined (think null in common programming languages)
	Undefined,
	/// A boolean: true or false.
	Boolean(bool),
	/// An 8-byte signed integer
	Int8(i64),
	/// An 8-byte floating point
	Float8(OrderedF64),
	/// A UTF-8 encoded text.
	Utf8(String),
}

impl Value {
	pub fn undefined() -> Self {
		Value::Undefined
	}

	pub fn bool(v: impl Into<bool>) -> Self {
		Value::Boolean(v.into())
	}

	pub fn int8(v: impl Into<i64>) -> Self {
		Value::Int8(v.into())
	}

	pub fn float8(v: impl Into<f64>) -> Self {
		OrderedF64::try_from(v.into()).map(Value::Float8).unwrap_or(Value::Undefined)
	}

	pub fn utf8(v: impl Into<String>) -> Self {
		Value::Utf8(v.into())
	}

	pub fn is_undefined(&self) -> bool {
		matches!(self, Value::Undefined)
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Boolean(b) => Some(*b),
			_ => None,
		}
	}

	/// Numeric view used for mixed integer/float comparison.
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Int8(v) => Some(*v as f64),
			Value::Float8(v) => Some(v.value()),
			_ => None,
		}
	}

	pub fn get_type(&self) -> Type {
		match self {
			Value::Undefined => Type::Undefined,
			Value::Boolean(_) => Type::Boolean,
			Value::Int8(_) => Type::Int8,
			Value::Float8(_) => Type::Float8,
			Value::Utf8(_) => Type::Utf8,
		}
	}

	/// Compares two values of compatible types.
	///
	/// Returns `None` when either side is undefined or the types cannot be
	/// compared; callers treat that as an unknown result.
	pub fn compare(&self, other: &Self) -> Option<Ordering> {
		match (self, other) {
			(Value::Boolean(l), Value::Boolean(r)) => Some(l.cmp(r)),
			(Value::Int8(l), Value::Int8(r)) => Some(l.cmp(r)),
			(Value::Float8(l), Value::Float8(r)) => Some(l.cmp(r)),
			(Value::Utf8(l), Value::Utf8(r)) => Some(l.cmp(r)),
			(Value::Int8(_), Value::Float8(_)) | (Value::Float8(_), Value::Int8(_)) => {
				let l = self.as_f64()?;
				let r = other.as_f64()?;
				l.partial_cmp(&r)
			}
			_ => None,
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Boolean(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Int8(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Value::Int8(value as i64)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::float8(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::Utf8(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::Utf8(value)
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Boolean(true) => f.write_str("true"),
			Value::Boolean(false) => f.write_str("false"),
			Value::Int8(value) => Display::fmt(value, f),
			Value::Float8(value) => Display::fmt(value, f),
			Value::Utf8(value) => write!(f, "'{}'", value),
			Value::Undefined => f.write_str("undefined"),
		}
	}
}
