// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use reifydb_rql::{Determinism, Expression, TableReference};
use tracing::{debug, instrument, trace};

use crate::{
	Result,
	config::RowSecurityConfig,
	def::PolicyDef,
	error::{CollaboratorError, PolicyError},
	interface::{PolicyCatalog, PolicyContext, PredicateCompiler, Rewriter},
};

/// Derives the predicate the active policies impose on a table.
pub struct FilterResolver<'a> {
	pub(crate) catalog: &'a dyn PolicyCatalog,
	pub(crate) compiler: &'a dyn PredicateCompiler,
	pub(crate) rewriter: &'a dyn Rewriter,
	pub(crate) config: RowSecurityConfig,
}

impl<'a> FilterResolver<'a> {
	pub fn new(
		catalog: &'a dyn PolicyCatalog,
		compiler: &'a dyn PredicateCompiler,
		rewriter: &'a dyn Rewriter,
	) -> Self {
		Self {
			catalog,
			compiler,
			rewriter,
			config: RowSecurityConfig::default(),
		}
	}

	pub fn with_config(mut self, config: RowSecurityConfig) -> Self {
		self.config = config;
		self
	}

	pub fn config(&self) -> &RowSecurityConfig {
		&self.config
	}

	/// The predicate a row of `table` has to satisfy to be visible or
	/// writable under the active policies.
	///
	/// Returns `None` when no active policy restricts the table. Several
	/// restricting policies are combined with `or`: a row satisfying any of
	/// them is accessible. When `table` is an alias the predicate refers to
	/// the alias.
	#[instrument(name = "policy::filter::effective_filter", level = "debug", skip(self, table, ctx), fields(table = %table))]
	pub fn effective_filter(&self, table: &TableReference, ctx: &mut dyn PolicyContext) -> Result<Option<Expression>> {
		if !self.config.enabled {
			return Ok(None);
		}

		let filters = {
			let Some(policies) = ctx.active_policies() else {
				return Ok(None);
			};
			if policies.is_empty() {
				return Ok(None);
			}

			let full_name = self.catalog.full_name(table.id)?;
			let physical = TableReference::new(table.id, full_name.as_str());

			let mut filters = Vec::new();
			for policy in policies.iter() {
				if let Some(filter) = self.policy_filter(&physical, policy)? {
					filters.push(filter);
				}
			}

			if filters.is_empty() {
				debug!("no active policy restricts the table");
				return Ok(None);
			}

			let mut result = Expression::or(filters);
			if table.is_alias() {
				result.rename_source(&full_name, table.name());
			}
			result
		};

		// policy membership does not change while the request executes
		ctx.set_determinism(Determinism::UserDeterministic);

		let simplified = self.rewriter.simplify(filters)?.into_expression();
		debug!(filter = %simplified, "effective row filter");
		Ok(Some(simplified))
	}

	/// Restricts `criteria` to the rows `filter` admits.
	#[instrument(name = "policy::filter::restrict_criteria", level = "trace", skip(self, criteria, filter))]
	pub fn restrict_criteria(&self, criteria: Option<Expression>, filter: &Expression) -> Result<Expression> {
		let combined = match criteria {
			None => filter.clone(),
			Some(criteria) => Expression::and(vec![criteria, filter.clone()]),
		};
		Ok(self.rewriter.simplify(combined)?.into_expression())
	}

	fn policy_filter(&self, table: &TableReference, policy: &PolicyDef) -> Result<Option<Expression>> {
		let cache = self.catalog.filter_cache();
		if self.config.cache_filters {
			if let Some(filter) = cache.get(table.id, &policy.name) {
				trace!(policy = %policy.name, "policy filter cache hit");
				return Ok(Some(filter));
			}
		}

		let Some(condition) = policy.condition(table.name()) else {
			return Ok(None);
		};
		trace!(policy = %policy.name, condition, "compiling policy filter");

		let definition_error = |source: CollaboratorError| PolicyError::PolicyDefinition {
			policy: policy.name.clone(),
			table: table.name().to_string(),
			source,
		};

		let parsed = self.compiler.parse(condition).map_err(definition_error)?;
		let resolved = self.compiler.resolve(parsed, table).map_err(definition_error)?;
		self.compiler.validate(&resolved).map_err(definition_error)?;

		if self.config.cache_filters {
			cache.insert(table.id, &policy.name, resolved.clone());
		}
		Ok(Some(resolved))
	}
}
