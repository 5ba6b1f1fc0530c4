// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{determinism::Determinism, expression::Expression};

/// The earliest point at which an expression can be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EvaluationLevel {
	/// Needs nothing but the expression itself; can be folded while planning.
	Planning,
	/// Needs the execution context: parameters, batched values, session or
	/// command scoped functions.
	Processing,
	/// Needs the row being processed: column references or subqueries.
	Row,
}

impl Expression {
	pub fn evaluation_level(&self) -> EvaluationLevel {
		let own = match self {
			Expression::Constant(_) => EvaluationLevel::Planning,
			Expression::Batch(_) | Expression::Parameter(_) => EvaluationLevel::Processing,
			Expression::Column(_) | Expression::Subquery(_) => return EvaluationLevel::Row,
			Expression::Call(call) => match call.determinism {
				Determinism::Deterministic => EvaluationLevel::Planning,
				_ => EvaluationLevel::Processing,
			},
			_ => EvaluationLevel::Planning,
		};

		let mut level = own;
		self.for_each_child(&mut |child| {
			if level < EvaluationLevel::Row {
				level = level.max(child.evaluation_level());
			}
		});
		level
	}

	/// Whether the expression can be fully evaluated while planning
	/// (`during_planning`), or at the latest during execution.
	pub fn is_fully_evaluatable(&self, during_planning: bool) -> bool {
		let level = self.evaluation_level();
		if during_planning {
			level == EvaluationLevel::Planning
		} else {
			level <= EvaluationLevel::Processing
		}
	}
}
