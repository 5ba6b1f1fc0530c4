// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// How stable the result of a function (or of a whole plan) is.
///
/// Ordered from least to most stable: a plan is only as deterministic as the
/// least deterministic thing it depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Determinism {
	/// Changes on every invocation, e.g. `rand()`
	Nondeterministic,
	/// Stable within a single command, e.g. `now()`
	CommandDeterministic,
	/// Stable within a session, e.g. session variables
	SessionDeterministic,
	/// Stable for a given user, e.g. `user()` or the active row security policies
	UserDeterministic,
	/// Always the same output for the same input
	Deterministic,
}

impl Determinism {
	/// Returns the more restrictive of both levels.
	pub fn restrict(self, other: Determinism) -> Determinism {
		self.min(other)
	}
}

impl Display for Determinism {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Determinism::Nondeterministic => f.write_str("NONDETERMINISTIC"),
			Determinism::CommandDeterministic => f.write_str("COMMAND_DETERMINISTIC"),
			Determinism::SessionDeterministic => f.write_str("SESSION_DETERMINISTIC"),
			Determinism::UserDeterministic => f.write_str("USER_DETERMINISTIC"),
			Determinism::Deterministic => f.write_str("DETERMINISTIC"),
		}
	}
}
