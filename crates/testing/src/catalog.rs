// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;
use reifydb_policy::{CollaboratorError, FilterCache, PolicyCatalog};
use reifydb_rql::{Expression, TableId, TableReference};

#[derive(Debug, Clone)]
struct TestTable {
	name: String,
	columns: Vec<TestColumn>,
}

#[derive(Debug, Clone)]
struct TestColumn {
	name: String,
	default: Option<Expression>,
}

/// In-memory table metadata.
#[derive(Debug, Default)]
pub struct TestCatalog {
	tables: IndexMap<TableId, TestTable>,
	cache: FilterCache,
}

impl TestCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	/// A catalog sharing `cache` with others, like two requests against the
	/// same database.
	pub fn with_cache(cache: FilterCache) -> Self {
		Self {
			cache,
			..Self::default()
		}
	}

	pub fn with_table(mut self, id: u64, name: &str, columns: &[&str]) -> Self {
		let columns = columns
			.iter()
			.map(|column| TestColumn {
				name: column.to_string(),
				default: None,
			})
			.collect();
		self.tables.insert(
			TableId(id),
			TestTable {
				name: name.to_string(),
				columns,
			},
		);
		self
	}

	pub fn with_default(mut self, id: u64, column: &str, default: Expression) -> Self {
		let table = self.tables.get_mut(&TableId(id)).unwrap_or_else(|| panic!("table {} not found", id));
		let column = table
			.columns
			.iter_mut()
			.find(|c| c.name.eq_ignore_ascii_case(column))
			.unwrap_or_else(|| panic!("column {} not found", column));
		column.default = Some(default);
		self
	}

	/// Reference to the physical table `id`.
	pub fn table(&self, id: u64) -> TableReference {
		TableReference::new(TableId(id), self.table_def(TableId(id)).name.as_str())
	}

	/// Reference to table `id` exposed under `alias`.
	pub fn alias(&self, id: u64, alias: &str) -> TableReference {
		TableReference::aliased(TableId(id), alias, self.table_def(TableId(id)).name.as_str())
	}

	/// Canonical spelling of `column` in `table`, if the table has it.
	pub fn find_column(&self, table: TableId, column: &str) -> Option<&str> {
		let table = self.tables.get(&table)?;
		table.columns.iter().find(|c| c.name.eq_ignore_ascii_case(column)).map(|c| c.name.as_str())
	}

	fn table_def(&self, id: TableId) -> &TestTable {
		self.tables.get(&id).unwrap_or_else(|| panic!("table {} not found", id))
	}

	fn find(&self, id: TableId) -> Result<&TestTable, CollaboratorError> {
		self.tables.get(&id).ok_or_else(|| CollaboratorError::Metadata(format!("table {} not found", id)))
	}
}

impl PolicyCatalog for TestCatalog {
	fn full_name(&self, table: TableId) -> Result<String, CollaboratorError> {
		Ok(self.find(table)?.name.clone())
	}

	fn columns(&self, table: TableId) -> Result<Vec<String>, CollaboratorError> {
		Ok(self.find(table)?.columns.iter().map(|c| c.name.clone()).collect())
	}

	fn column_default(&self, table: TableId, column: &str) -> Result<Option<Expression>, CollaboratorError> {
		let table = self.find(table)?;
		let column = table
			.columns
			.iter()
			.find(|c| c.name.eq_ignore_ascii_case(column))
			.ok_or_else(|| CollaboratorError::Metadata(format!("column {} not found in {}", column, table.name)))?;
		Ok(column.default.clone())
	}

	fn filter_cache(&self) -> &FilterCache {
		&self.cache
	}
}
