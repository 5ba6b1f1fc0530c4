// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableId(pub u64);

impl Display for TableId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(&self.0, f)
	}
}

/// The source a column reference belongs to.
///
/// `name` is the name the source is exposed under. When the source is an
/// alias, `definition` holds the name of the table it stands for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceIdentifier {
	pub name: String,
	pub definition: Option<String>,
}

impl SourceIdentifier {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			definition: None,
		}
	}

	pub fn aliased(alias: impl Into<String>, definition: impl Into<String>) -> Self {
		Self {
			name: alias.into(),
			definition: Some(definition.into()),
		}
	}

	pub fn is_alias(&self) -> bool {
		self.definition.is_some()
	}
}

impl Display for SourceIdentifier {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.name)
	}
}

/// A reference to the physical table a command reads from or writes to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableReference {
	pub id: TableId,
	pub source: SourceIdentifier,
}

impl TableReference {
	pub fn new(id: TableId, name: impl Into<String>) -> Self {
		Self {
			id,
			source: SourceIdentifier::new(name),
		}
	}

	pub fn aliased(id: TableId, alias: impl Into<String>, definition: impl Into<String>) -> Self {
		Self {
			id,
			source: SourceIdentifier::aliased(alias, definition),
		}
	}

	/// The name the table is exposed under within the command.
	pub fn name(&self) -> &str {
		&self.source.name
	}

	pub fn definition(&self) -> Option<&str> {
		self.source.definition.as_deref()
	}

	pub fn is_alias(&self) -> bool {
		self.source.is_alias()
	}
}

impl Display for TableReference {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match &self.source.definition {
			Some(definition) => write!(f, "{} AS {}", definition, self.source.name),
			None => f.write_str(&self.source.name),
		}
	}
}
