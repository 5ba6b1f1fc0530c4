// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Column substitution and source renaming.
//!
//! Predicates handed out by the row security cache are shared. Everything in
//! here either works on `&mut self` of an expression the caller already owns,
//! or returns a fresh copy and leaves `self` untouched.

use indexmap::IndexMap;

use crate::{
	expression::{ColumnExpression, Expression},
	source::SourceIdentifier,
};

/// Column name to replacement expression.
///
/// Keys are case-insensitive, matching how column names are resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
	values: IndexMap<String, Expression>,
}

impl Bindings {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, column: impl AsRef<str>, value: Expression) -> Option<Expression> {
		self.values.insert(column.as_ref().to_lowercase(), value)
	}

	pub fn get(&self, column: &str) -> Option<&Expression> {
		self.values.get(&column.to_lowercase())
	}

	pub fn contains(&self, column: &str) -> bool {
		self.values.contains_key(&column.to_lowercase())
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Expression)> {
		self.values.iter().map(|(k, v)| (k.as_str(), v))
	}
}

impl<K: AsRef<str>> FromIterator<(K, Expression)> for Bindings {
	fn from_iter<I: IntoIterator<Item = (K, Expression)>>(iter: I) -> Self {
		let mut result = Bindings::new();
		for (column, value) in iter {
			result.insert(column, value);
		}
		result
	}
}

impl Expression {
	/// Returns a copy of this expression with every bound column replaced.
	pub fn substitute(&self, bindings: &Bindings) -> Expression {
		let mut result = self.clone();
		result.substitute_in_place(bindings);
		result
	}

	/// Replaces every bound column reference with its binding.
	///
	/// Replacements are not visited again, so a binding may refer to the
	/// column it replaces (`amount = amount + 1`).
	pub fn substitute_in_place(&mut self, bindings: &Bindings) {
		if bindings.is_empty() {
			return;
		}
		if let Expression::Column(ColumnExpression {
			name,
			..
		}) = self
		{
			if let Some(value) = bindings.get(name) {
				*self = value.clone();
			}
			return;
		}
		self.for_each_child_mut(&mut |child| child.substitute_in_place(bindings));
	}

	/// Re-targets every column that refers to the physical source `definition`
	/// to the alias `alias`, so the expression can be spliced into a command
	/// that addresses the table under that alias.
	pub fn rename_source(&mut self, definition: &str, alias: &str) {
		if let Expression::Column(ColumnExpression {
			source,
			..
		}) = self
		{
			if source.definition.is_none() && source.name.eq_ignore_ascii_case(definition) {
				*source = SourceIdentifier::aliased(alias, definition);
			}
			return;
		}
		self.for_each_child_mut(&mut |child| child.rename_source(definition, alias));
	}
}
