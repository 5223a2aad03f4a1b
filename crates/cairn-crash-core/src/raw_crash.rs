// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Raw crash submissions.

use serde_json::{Map, Value};

/// The metadata a client submitted with a crash: a flat mapping of string
/// keys to scalar values.
///
/// Raw crashes are write-once: created at submission time and never modified
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RawCrash(Map<String, Value>);

impl RawCrash {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	pub fn insert(&mut self, key: impl Into<String>, value: Value) {
		self.0.insert(key.into(), value);
	}

	/// The throttle flag some collectors attach. Clients send it as a number
	/// or a numeric string; anything else reads as absent.
	pub fn legacy_processing(&self) -> Option<i64> {
		match self.0.get("legacy_processing") {
			Some(Value::Number(n)) => n.as_i64(),
			Some(Value::String(s)) => s.trim().parse().ok(),
			_ => None,
		}
	}

	/// The submission timestamp, when the collector recorded one.
	pub fn submitted_timestamp(&self) -> Option<&str> {
		self.0.get("submitted_timestamp").and_then(Value::as_str)
	}

	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}

	pub fn into_map(self) -> Map<String, Value> {
		self.0
	}
}

impl From<Map<String, Value>> for RawCrash {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn raw(value: Value) -> RawCrash {
		let mut crash = RawCrash::new();
		crash.insert("legacy_processing", value);
		crash
	}

	#[test]
	fn legacy_processing_reads_numbers_and_numeric_strings() {
		assert_eq!(raw(json!(0)).legacy_processing(), Some(0));
		assert_eq!(raw(json!(5)).legacy_processing(), Some(5));
		assert_eq!(raw(json!("1")).legacy_processing(), Some(1));
	}

	#[test]
	fn legacy_processing_absent_or_malformed_reads_as_none() {
		assert_eq!(RawCrash::new().legacy_processing(), None);
		assert_eq!(raw(json!("throttle me")).legacy_processing(), None);
		assert_eq!(raw(json!(null)).legacy_processing(), None);
	}

	#[test]
	fn submitted_timestamp_is_the_raw_string() {
		let mut crash = RawCrash::new();
		crash.insert(
			"submitted_timestamp",
			json!("2013-01-09T22:21:18.646733+00:00"),
		);
		assert_eq!(
			crash.submitted_timestamp(),
			Some("2013-01-09T22:21:18.646733+00:00")
		);
	}
}
