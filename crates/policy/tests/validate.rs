// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod common;

use common::{ORDERS, catalog, column, orders_policy};
use reifydb_policy::{
	CollaboratorError, EnforcedCommand, FilterResolver, Outcome, PolicyError, WriteEnforcer, check_constraints,
};
use reifydb_rql::{
	BatchCommand, Command, DeleteCommand, Expression, InsertCommand, ProcedureCommand, SetClause, UpdateCommand,
};
use reifydb_testing::{TestCatalog, TestCompiler, TestContext, TestEvaluator, TestRewriter};
use reifydb_type::Value;

fn batch(values: &[i64]) -> Expression {
	Expression::batch(values.iter().map(|v| Value::int8(*v)))
}

fn enforce(catalog: &TestCatalog, condition: &str, command: Command) -> EnforcedCommand {
	let compiler = TestCompiler::new(catalog);
	let rewriter = TestRewriter::new();
	let enforcer = WriteEnforcer::new(FilterResolver::new(catalog, &compiler, &rewriter));
	let mut ctx = TestContext::new([orders_policy(condition, condition)]);
	enforcer.enforce(command, &mut ctx).unwrap()
}

fn batched_update(catalog: &TestCatalog, amounts: &[i64]) -> Command {
	Command::Update(UpdateCommand::new(catalog.table(ORDERS), vec![SetClause::new("amount", batch(amounts))]))
}

#[test]
fn test_batched_update_checks_every_row() {
	let catalog = catalog();

	let failing = enforce(&catalog, "amount > 1", batched_update(&catalog, &[1, 2, 3]));
	let mut evaluator = TestEvaluator::new();
	let err = check_constraints(&failing.command, &mut evaluator).unwrap_err();
	assert!(matches!(err, PolicyError::ConstraintViolation { ref table } if table == "sales.orders"));
	// the first row already fails
	assert_eq!(evaluator.evaluated(), 1);

	let passing = enforce(&catalog, "amount > 1", batched_update(&catalog, &[2, 3, 4]));
	let mut evaluator = TestEvaluator::new();
	assert_eq!(check_constraints(&passing.command, &mut evaluator).unwrap(), Outcome::Ready(()));
	assert_eq!(evaluator.evaluated(), 3);
}

#[test]
fn test_batched_insert_with_scalar_values() {
	let catalog = catalog();
	let command = Command::Insert(InsertCommand::values(
		catalog.table(ORDERS),
		vec!["id".to_string(), "amount".to_string(), "region".to_string()],
		vec![batch(&[1, 2]), batch(&[10, 20]), Expression::parameter("region")],
	));
	let enforced = enforce(&catalog, "amount < 100 and region == 'eu'", command);

	let mut evaluator = TestEvaluator::new().with_parameter("region", "eu");
	assert_eq!(check_constraints(&enforced.command, &mut evaluator).unwrap(), Outcome::Ready(()));
	assert_eq!(evaluator.evaluated(), 2);

	let mut evaluator = TestEvaluator::new().with_parameter("region", "us");
	assert!(matches!(
		check_constraints(&enforced.command, &mut evaluator),
		Err(PolicyError::ConstraintViolation { .. })
	));
}

#[test]
fn test_runtime_parameter_value() {
	let catalog = catalog();
	let command = Command::Update(UpdateCommand::new(
		catalog.table(ORDERS),
		vec![SetClause::new("amount", Expression::parameter("amount"))],
	));
	let enforced = enforce(&catalog, "amount < 1000", command);

	let mut evaluator = TestEvaluator::new().with_parameter("amount", 500);
	assert_eq!(check_constraints(&enforced.command, &mut evaluator).unwrap(), Outcome::Ready(()));

	let mut evaluator = TestEvaluator::new().with_parameter("amount", 2000);
	assert!(matches!(
		check_constraints(&enforced.command, &mut evaluator),
		Err(PolicyError::ConstraintViolation { .. })
	));
}

#[test]
fn test_undefined_result_is_a_violation() {
	let catalog = catalog();
	let command = Command::Update(UpdateCommand::new(
		catalog.table(ORDERS),
		vec![SetClause::new("amount", Expression::parameter("amount"))],
	));
	let enforced = enforce(&catalog, "amount < 1000", command);

	let mut evaluator = TestEvaluator::new().with_parameter("amount", Value::Undefined);
	assert!(matches!(
		check_constraints(&enforced.command, &mut evaluator),
		Err(PolicyError::ConstraintViolation { .. })
	));
}

#[test]
fn test_insert_from_query_checks_current_row() {
	let catalog = catalog();
	let command = Command::Insert(InsertCommand::query(
		catalog.table(ORDERS),
		vec!["id".to_string(), "amount".to_string()],
		"from sales.staging",
	));
	let enforced = enforce(&catalog, "amount < 1000", command);

	let mut evaluator = TestEvaluator::new();
	evaluator.set_row([("id", Value::int8(1)), ("amount", Value::int8(10))]);
	assert_eq!(check_constraints(&enforced.command, &mut evaluator).unwrap(), Outcome::Ready(()));

	evaluator.set_row([("id", Value::int8(2)), ("amount", Value::int8(5000))]);
	assert!(matches!(
		check_constraints(&enforced.command, &mut evaluator),
		Err(PolicyError::ConstraintViolation { .. })
	));

	// without a current row the column cannot be evaluated
	let mut evaluator = TestEvaluator::new();
	assert!(matches!(
		check_constraints(&enforced.command, &mut evaluator),
		Err(PolicyError::Collaborator(CollaboratorError::Evaluate(_)))
	));
}

#[test]
fn test_suspension_is_propagated_and_retried_from_start() {
	let catalog = catalog();
	let enforced = enforce(&catalog, "amount > 1", batched_update(&catalog, &[2, 3, 4]));

	let mut evaluator = TestEvaluator::new().suspending(1);
	assert_eq!(check_constraints(&enforced.command, &mut evaluator).unwrap(), Outcome::Suspended);
	assert_eq!(evaluator.evaluated(), 0);

	assert_eq!(check_constraints(&enforced.command, &mut evaluator).unwrap(), Outcome::Ready(()));
	assert_eq!(evaluator.evaluated(), 3);
}

#[test]
fn test_batch_size_mismatch() {
	let catalog = catalog();
	let mut update = UpdateCommand::new(
		catalog.table(ORDERS),
		vec![SetClause::new("amount", batch(&[1, 2, 3])), SetClause::new("id", batch(&[1, 2]))],
	);
	update.constraint = Some(Expression::GreaterThan(Expression::binary(column("amount"), Expression::constant(0))));

	let err = check_constraints(&Command::Update(update), &mut TestEvaluator::new()).unwrap_err();
	let PolicyError::BatchSizeMismatch {
		expected,
		actual,
		..
	} = err
	else {
		panic!("expected batch size mismatch, got: {}", err);
	};
	assert_eq!((expected, actual), (3, 2));
}

#[test]
fn test_commands_without_constraint_pass() {
	let catalog = catalog();
	let mut evaluator = TestEvaluator::new();

	let unconstrained = Command::Update(UpdateCommand::new(
		catalog.table(ORDERS),
		vec![SetClause::new("amount", Expression::constant(5000))],
	));
	let delete = Command::Delete(DeleteCommand::new(catalog.table(ORDERS), None));
	let compensated = enforce(
		&catalog,
		"amount < 1000",
		Command::Update(UpdateCommand::new(
			catalog.table(ORDERS),
			vec![SetClause::new("amount", Expression::Mul(Expression::binary(column("amount"), Expression::constant(2))))],
		)),
	);

	// the guard replaces the constraint of a compensated update
	assert_eq!(compensated.command.constraint(), None);

	for command in [unconstrained, delete, compensated.command] {
		assert_eq!(check_constraints(&command, &mut evaluator).unwrap(), Outcome::Ready(()));
	}
	assert_eq!(evaluator.evaluated(), 0);
}

#[test]
fn test_nested_commands_are_checked() {
	let catalog = catalog();
	let failing = enforce(&catalog, "amount > 1", batched_update(&catalog, &[1, 2]));
	let passing = enforce(&catalog, "amount > 1", batched_update(&catalog, &[2, 3]));

	let batch = Command::Batch(BatchCommand {
		commands: vec![passing.command.clone(), failing.command.clone()],
	});
	assert!(matches!(
		check_constraints(&batch, &mut TestEvaluator::new()),
		Err(PolicyError::ConstraintViolation { .. })
	));

	let procedure = Command::Procedure(ProcedureCommand {
		procedure: "orders_view_update".to_string(),
		container: Box::new(passing.command),
	});
	let mut evaluator = TestEvaluator::new();
	assert_eq!(check_constraints(&procedure, &mut evaluator).unwrap(), Outcome::Ready(()));
	assert_eq!(evaluator.evaluated(), 2);
}
