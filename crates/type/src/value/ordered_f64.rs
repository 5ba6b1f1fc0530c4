// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::{
	cmp::Ordering,
	fmt::{Display, Formatter},
	hash::{Hash, Hasher},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An `f64` that is never NaN, which makes it totally ordered.
#[derive(Clone, Copy, Debug)]
pub struct OrderedF64(f64);

impl OrderedF64 {
	pub fn value(&self) -> f64 {
		self.0
	}
}

impl TryFrom<f64> for OrderedF64 {
	type Error = f64;

	fn try_from(value: f64) -> Result<Self, Self::Error> {
		if value.is_nan() {
			Err(value)
		} else {
			// normalise -0.0 so that Eq and Hash agree
			Ok(OrderedF64(if value == 0.0 {
				0.0
			} else {
				value
			}))
		}
	}
}

impl PartialEq for OrderedF64 {
	fn eq(&self, other: &Self) -> bool {
		self.0 == other.0
	}
}

impl Eq for OrderedF64 {}

impl PartialOrd for OrderedF64 {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for OrderedF64 {
	fn cmp(&self, other: &Self) -> Ordering {
		self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
	}
}

impl Hash for OrderedF64 {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.0.to_bits().hash(state)
	}
}

impl Display for OrderedF64 {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(&self.0, f)
	}
}

impl Serialize for OrderedF64 {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_f64(self.0)
	}
}

impl<'de> Deserialize<'de> for OrderedF64 {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let value = f64::deserialize(deserializer)?;
		OrderedF64::try_from(value).map_err(|_| serde::de::Error::custom("NaN is not a valid Float8"))
	}
}
