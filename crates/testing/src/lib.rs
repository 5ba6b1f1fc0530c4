// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! In-memory implementations of the collaborators row security depends on.
//!
//! Nothing in here is meant for production use: the parser understands just
//! enough of the predicate grammar to express policy conditions in tests.

mod catalog;
mod compiler;
mod context;
mod evaluator;
pub mod fold;
mod rewriter;

use std::sync::Once;

pub use catalog::TestCatalog;
pub use compiler::TestCompiler;
pub use context::TestContext;
pub use evaluator::TestEvaluator;
pub use rewriter::TestRewriter;

static TRACING: Once = Once::new();

/// Installs a fmt subscriber honouring `RUST_LOG`, once per process.
pub fn init_tracing() {
	TRACING.call_once(|| {
		let _ = tracing_subscriber::fmt()
			.with_env_filter(
				tracing_subscriber::EnvFilter::try_from_default_env()
					.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
			)
			.with_test_writer()
			.try_init();
	});
}
