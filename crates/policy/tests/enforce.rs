// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod common;

use common::{CUSTOMERS, ORDERS, catalog, column, orders_policy};
use reifydb_policy::{Enforcement, FilterResolver, PolicyError, WriteEnforcer, check_constraints};
use reifydb_rql::{
	BatchCommand, Command, DeleteCommand, Determinism, Expression, InsertCommand, ProcedureCommand, SetClause,
	UpdateCommand,
};
use reifydb_testing::{TestCatalog, TestCompiler, TestContext, TestEvaluator, TestRewriter};
use reifydb_type::Value;

fn update(catalog: &TestCatalog, changes: Vec<SetClause>) -> Command {
	Command::Update(UpdateCommand::new(catalog.table(ORDERS), changes))
}

fn insert(catalog: &TestCatalog, columns: &[&str], values: Vec<Expression>) -> Command {
	Command::Insert(InsertCommand::values(
		catalog.table(ORDERS),
		columns.iter().map(|c| c.to_string()).collect(),
		values,
	))
}

fn doubled_amount() -> Expression {
	Expression::Mul(Expression::binary(column("amount"), Expression::constant(2)))
}

#[test]
fn test_unrestricted_table_is_left_alone() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));

	let command = update(&catalog, vec![SetClause::new("amount", Expression::constant(5000))]);
	let enforced = enforcer.enforce(command.clone(), &mut TestContext::unsecured()).unwrap();

	assert_eq!(enforced.enforcement, Enforcement::Unrestricted);
	assert_eq!(enforced.command, command);
}

#[test]
fn test_static_update_violation_is_rejected() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("small", "amount < 1000")]);

	let command = update(&catalog, vec![SetClause::new("amount", Expression::constant(5000))]);
	let err = enforcer.enforce(command, &mut ctx).unwrap_err();

	assert!(matches!(err, PolicyError::ConstraintViolation { ref table } if table == "sales.orders"));
	assert_eq!(err.code(), "RLS_002");
}

#[test]
fn test_static_update_satisfying_filter_needs_no_check() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("small", "amount < 1000")]);

	let enforced = enforcer
		.enforce(update(&catalog, vec![SetClause::new("amount", Expression::constant(10))]), &mut ctx)
		.unwrap();

	assert_eq!(enforced.enforcement, Enforcement::Satisfied);
	let Command::Update(update) = enforced.command else {
		panic!("expected update");
	};
	assert_eq!(update.constraint, None);
	assert_eq!(update.criteria.unwrap().to_string(), "(sales.orders.amount < 1000)");
	assert_eq!(ctx.determinism(), Determinism::UserDeterministic);
}

#[test]
fn test_update_of_unrelated_column_keeps_residual_constraint() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("small_eu", "amount < 1000 and region == 'eu'")]);

	let command = Command::Update(
		UpdateCommand::new(catalog.table(ORDERS), vec![SetClause::new("amount", Expression::constant(10))])
			.with_criteria(Expression::Equal(Expression::binary(column("id"), Expression::constant(7)))),
	);
	let enforced = enforcer.enforce(command, &mut ctx).unwrap();

	assert_eq!(enforced.enforcement, Enforcement::Constrained);
	let Command::Update(update) = enforced.command else {
		panic!("expected update");
	};
	assert_eq!(update.constraint.unwrap().to_string(), "(sales.orders.region == 'eu')");
	assert_eq!(
		update.criteria.unwrap().to_string(),
		"((sales.orders.id == 7) and (sales.orders.amount < 1000) and (sales.orders.region == 'eu'))"
	);
}

#[test]
fn test_row_dependent_update_is_compensated() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("small", "amount < 1000")]);

	let enforced = enforcer.enforce(update(&catalog, vec![SetClause::new("amount", doubled_amount())]), &mut ctx).unwrap();

	assert_eq!(enforced.enforcement, Enforcement::Compensated);
	let Command::Compensated(procedure) = enforced.command else {
		panic!("expected guarded update");
	};
	assert_eq!(procedure.guard.to_string(), "((sales.orders.amount * 2) < 1000)");
	assert_eq!(procedure.update.constraint, None);
	assert_eq!(procedure.update.criteria.unwrap().to_string(), "(sales.orders.amount < 1000)");
	assert_eq!(rewriter.guarded(), 1);
}

#[test]
fn test_compensation_wins_over_static_violation() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("eu_small", "region == 'eu' and amount < 1000")]);

	let command = update(
		&catalog,
		vec![SetClause::new("region", Expression::constant("us")), SetClause::new("amount", doubled_amount())],
	);
	let enforced = enforcer.enforce(command, &mut ctx).unwrap();

	assert_eq!(enforced.enforcement, Enforcement::Compensated);
}

#[test]
fn test_static_values_satisfying_filter_skip_compensation() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("eu_only", "region == 'eu'")]);

	let command = update(
		&catalog,
		vec![SetClause::new("region", Expression::constant("eu")), SetClause::new("amount", doubled_amount())],
	);
	let enforced = enforcer.enforce(command, &mut ctx).unwrap();

	assert_eq!(enforced.enforcement, Enforcement::Satisfied);
	assert_eq!(enforced.command.constraint(), None);
	assert_eq!(rewriter.guarded(), 0);
}

#[test]
fn test_update_to_undefined_is_rejected() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("small", "amount < 1000")]);

	let command = update(&catalog, vec![SetClause::new("amount", Expression::undefined())]);
	let err = enforcer.enforce(command, &mut ctx).unwrap_err();

	assert!(matches!(err, PolicyError::ConstraintViolation { ref table } if table == "sales.orders"));
	assert_eq!(rewriter.guarded(), 0);
}

#[test]
fn test_compensation_failure_is_reported() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::rejecting_compensation();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("small", "amount < 1000")]);

	let err =
		enforcer.enforce(update(&catalog, vec![SetClause::new("amount", doubled_amount())]), &mut ctx).unwrap_err();

	assert!(matches!(err, PolicyError::CompensationPlanning { ref table, .. } if table == "sales.orders"));
	assert_eq!(err.code(), "RLS_003");
}

#[test]
fn test_runtime_update_value_is_constrained() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("small", "amount < 1000")]);

	let batched = update(&catalog, vec![SetClause::new("amount", Expression::batch([Value::int8(1), Value::int8(2)]))]);
	let parameter = update(&catalog, vec![SetClause::new("amount", Expression::parameter("amount"))]);

	for command in [batched, parameter] {
		let enforced = enforcer.enforce(command, &mut ctx).unwrap();
		assert_eq!(enforced.enforcement, Enforcement::Constrained);
		assert_eq!(enforced.command.constraint().unwrap().to_string(), "(sales.orders.amount < 1000)");
	}
	assert_eq!(rewriter.guarded(), 0);
}

#[test]
fn test_insert_values() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("small", "amount < 1000")]);

	let rejected = insert(&catalog, &["id", "amount"], vec![Expression::constant(1), Expression::constant(2000)]);
	assert!(matches!(enforcer.enforce(rejected, &mut ctx), Err(PolicyError::ConstraintViolation { .. })));

	let accepted = insert(&catalog, &["id", "amount"], vec![Expression::constant(1), Expression::constant(500)]);
	let enforced = enforcer.enforce(accepted, &mut ctx).unwrap();
	assert_eq!(enforced.enforcement, Enforcement::Satisfied);
	assert_eq!(enforced.command.constraint(), None);
}

#[test]
fn test_insert_column_list_is_case_insensitive() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("small", "amount < 1000")]);

	let command = insert(&catalog, &["ID", "Amount"], vec![Expression::constant(1), Expression::constant(500)]);
	assert_eq!(enforcer.enforce(command, &mut ctx).unwrap().enforcement, Enforcement::Satisfied);
}

#[test]
fn test_insert_unlisted_column_takes_default() {
	let catalog = catalog().with_default(ORDERS, "region", Expression::constant("eu"));
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("eu_only", "region == 'eu'")]);

	let command = insert(&catalog, &["id"], vec![Expression::constant(1)]);
	assert_eq!(enforcer.enforce(command, &mut ctx).unwrap().enforcement, Enforcement::Satisfied);
}

#[test]
fn test_insert_unlisted_column_without_default_is_undefined() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("eu_only", "region == 'eu'")]);

	let command = insert(&catalog, &["id"], vec![Expression::constant(1)]);
	assert!(matches!(enforcer.enforce(command, &mut ctx), Err(PolicyError::ConstraintViolation { .. })));

	let mut ctx = TestContext::new([orders_policy("unowned", "owner is undefined")]);
	let command = insert(&catalog, &["id"], vec![Expression::constant(1)]);
	assert_eq!(enforcer.enforce(command, &mut ctx).unwrap().enforcement, Enforcement::Satisfied);
}

#[test]
fn test_insert_parameter_value_is_constrained() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("small", "amount < 1000")]);

	let command = insert(&catalog, &["id", "amount"], vec![Expression::constant(1), Expression::parameter("amount")]);
	let enforced = enforcer.enforce(command, &mut ctx).unwrap();

	assert_eq!(enforced.enforcement, Enforcement::Constrained);
	assert_eq!(enforced.command.constraint().unwrap().to_string(), "(sales.orders.amount < 1000)");
}

#[test]
fn test_insert_from_query_attaches_filter() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));

	for condition in ["amount < 1000", "false"] {
		let mut ctx = TestContext::new([orders_policy(condition, condition)]);
		let filter = enforcer.resolver().effective_filter(&catalog.table(ORDERS), &mut ctx).unwrap();

		let command = Command::Insert(InsertCommand::query(
			catalog.table(ORDERS),
			vec!["id".to_string(), "amount".to_string()],
			"from sales.staging",
		));
		let enforced = enforcer.enforce(command, &mut ctx).unwrap();

		assert_eq!(enforced.enforcement, Enforcement::Constrained);
		assert_eq!(enforced.command.constraint(), filter.as_ref());
	}
}

#[test]
fn test_delete_is_restricted_to_visible_rows() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("eu_only", "region == 'eu'")]);

	let unqualified = Command::Delete(DeleteCommand::new(catalog.table(ORDERS), None));
	let Command::Delete(delete) = enforcer.enforce(unqualified, &mut ctx).unwrap().command else {
		panic!("expected delete");
	};
	assert_eq!(delete.criteria.unwrap().to_string(), "(sales.orders.region == 'eu')");

	let qualified = Command::Delete(DeleteCommand::new(
		catalog.table(ORDERS),
		Some(Expression::GreaterThan(Expression::binary(column("id"), Expression::constant(10)))),
	));
	let enforced = enforcer.enforce(qualified, &mut ctx).unwrap();
	assert_eq!(enforced.enforcement, Enforcement::Filtered);
	let Command::Delete(delete) = enforced.command else {
		panic!("expected delete");
	};
	assert_eq!(delete.criteria.unwrap().to_string(), "((sales.orders.id > 10) and (sales.orders.region == 'eu'))");
}

#[test]
fn test_procedure_restricts_container_only() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("small", "amount < 1000")]);

	// a value violating the filter is not rejected when written through a procedure
	let command = Command::Procedure(ProcedureCommand {
		procedure: "orders_view_update".to_string(),
		container: Box::new(update(&catalog, vec![SetClause::new("amount", Expression::constant(5000))])),
	});
	let enforced = enforcer.enforce(command, &mut ctx).unwrap();

	assert_eq!(enforced.enforcement, Enforcement::Procedural);
	let Command::Procedure(procedure) = enforced.command else {
		panic!("expected procedure");
	};
	let Command::Update(update) = *procedure.container else {
		panic!("expected update container");
	};
	assert_eq!(update.criteria.unwrap().to_string(), "(sales.orders.amount < 1000)");
	assert_eq!(update.constraint, None);
}

#[test]
fn test_procedure_insert_is_checked_while_executing() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("small", "amount < 1000")]);

	let wrap = |amount: i64| {
		Command::Procedure(ProcedureCommand {
			procedure: "orders_view_insert".to_string(),
			container: Box::new(insert(
				&catalog,
				&["id", "amount"],
				vec![Expression::constant(1), Expression::constant(amount)],
			)),
		})
	};

	let enforced = enforcer.enforce(wrap(5000), &mut ctx).unwrap();
	assert_eq!(enforced.enforcement, Enforcement::Procedural);
	let Command::Procedure(procedure) = &enforced.command else {
		panic!("expected procedure");
	};
	assert_eq!(procedure.container.constraint().unwrap().to_string(), "(sales.orders.amount < 1000)");
	assert!(matches!(
		check_constraints(&enforced.command, &mut TestEvaluator::new()),
		Err(PolicyError::ConstraintViolation { .. })
	));

	let enforced = enforcer.enforce(wrap(500), &mut ctx).unwrap();
	assert!(check_constraints(&enforced.command, &mut TestEvaluator::new()).is_ok());
}

#[test]
fn test_batch_enforces_each_command() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("small", "amount < 1000")]);

	let batch = Command::Batch(BatchCommand {
		commands: vec![
			insert(&catalog, &["id", "amount"], vec![Expression::constant(1), Expression::constant(10)]),
			Command::Delete(DeleteCommand::new(catalog.table(CUSTOMERS), None)),
			update(&catalog, vec![SetClause::new("amount", doubled_amount())]),
		],
	});
	let enforced = enforcer.enforce(batch, &mut ctx).unwrap();

	assert_eq!(
		enforced.enforcement,
		Enforcement::Batched(vec![Enforcement::Satisfied, Enforcement::Unrestricted, Enforcement::Compensated])
	);

	let failing = Command::Batch(BatchCommand {
		commands: vec![
			insert(&catalog, &["id", "amount"], vec![Expression::constant(1), Expression::constant(10)]),
			insert(&catalog, &["id", "amount"], vec![Expression::constant(2), Expression::constant(2000)]),
		],
	});
	assert!(matches!(enforcer.enforce(failing, &mut ctx), Err(PolicyError::ConstraintViolation { .. })));
}

#[test]
fn test_compensated_command_passes_through() {
	let catalog = catalog();
	let compiler = TestCompiler::new(&catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(&catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy("small", "amount < 1000")]);

	let compensated = enforcer.enforce(update(&catalog, vec![SetClause::new("amount", doubled_amount())]), &mut ctx).unwrap();
	let again = enforcer.enforce(compensated.command.clone(), &mut ctx).unwrap();

	assert_eq!(again, compensated);
	assert_eq!(rewriter.guarded(), 1);
}
