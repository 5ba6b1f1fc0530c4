// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Row level security.
//!
//! The [`FilterResolver`] derives the predicate the active policies impose on
//! a table, the [`WriteEnforcer`] folds that predicate into write commands
//! while planning, and [`check_constraints`] re-checks whatever could not be
//! decided while planning against the values actually written.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod cache;
pub mod config;
pub mod def;
pub mod enforce;
pub mod error;
pub mod filter;
pub mod interface;
pub mod validate;

pub use cache::FilterCache;
pub use config::RowSecurityConfig;
pub use def::{ActivePolicySet, PermissionDef, PolicyDef};
pub use enforce::{EnforcedCommand, Enforcement, WriteEnforcer};
pub use error::{CollaboratorError, PolicyError};
pub use filter::FilterResolver;
pub use interface::{Evaluator, Outcome, PolicyCatalog, PolicyContext, PredicateCompiler, Rewriter, Simplified};
pub use validate::check_constraints;

pub type Result<T> = std::result::Result<T, PolicyError>;
