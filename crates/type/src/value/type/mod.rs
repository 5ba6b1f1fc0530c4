// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// All RQL data types a row security predicate can reference
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Type {
	/// Value is not defined
	Undefined,
	/// A boolean: true or false.
	Boolean,
	/// An 8-byte signed integer
	Int8,
	/// An 8-byte floating point
	Float8,
	/// A UTF-8 encoded text.
	Utf8,
}

impl Type {
	pub fn is_number(&self) -> bool {
		matches!(self, Type::Int8 | Type::Float8)
	}
}

impl Display for Type {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Type::Undefined => f.write_str("UNDEFINED"),
			Type::Boolean => f.write_str("BOOLEAN"),
			Type::Int8 => f.write_str("INT8"),
			Type::Float8 => f.write_str("FLOAT8"),
			Type::Utf8 => f.write_str("UTF8"),
		}
	}
}
