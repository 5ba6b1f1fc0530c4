// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![allow(dead_code)]

use reifydb_policy::PolicyDef;
use reifydb_rql::{Expression, SourceIdentifier};
use reifydb_testing::TestCatalog;

pub const ORDERS: u64 = 1;
pub const CUSTOMERS: u64 = 2;

pub fn catalog() -> TestCatalog {
	reifydb_testing::init_tracing();
	TestCatalog::new()
		.with_table(ORDERS, "sales.orders", &["id", "amount", "region", "owner"])
		.with_table(CUSTOMERS, "sales.customers", &["id", "name"])
}

/// A policy restricting `sales.orders` by `condition`.
pub fn orders_policy(name: &str, condition: &str) -> PolicyDef {
	PolicyDef::new(name).with_condition("sales.orders", condition)
}

pub fn column(name: &str) -> Expression {
	Expression::column(SourceIdentifier::new("sales.orders"), name)
}
