// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Processed crash records.

use serde_json::{Map, Value};

/// The analysis record derived from a raw crash.
///
/// Processed crashes are nested; they carry a `uuid` equal to the owning
/// crash ID and a `signature`, and may carry sensitive subtrees (URLs,
/// emails, user identifiers, per-dump analysis blocks). Reprocessing
/// rewrites the whole record; there is no partial patch.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ProcessedCrash(Map<String, Value>);

impl ProcessedCrash {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	pub fn insert(&mut self, key: impl Into<String>, value: Value) {
		self.0.insert(key.into(), value);
	}

	/// The crash ID this record belongs to.
	pub fn uuid(&self) -> Option<&str> {
		self.0.get("uuid").and_then(Value::as_str)
	}

	pub fn signature(&self) -> Option<&str> {
		self.0.get("signature").and_then(Value::as_str)
	}

	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}

	pub(crate) fn as_map_mut(&mut self) -> &mut Map<String, Value> {
		&mut self.0
	}

	pub fn into_map(self) -> Map<String, Value> {
		self.0
	}
}

impl From<Map<String, Value>> for ProcessedCrash {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn uuid_and_signature_accessors() {
		let mut processed = ProcessedCrash::new();
		processed.insert("uuid", json!("936ce666-ff3b-4c7a-9674-367fe2120408"));
		processed.insert("signature", json!("now_this_is_a_signature"));

		assert_eq!(
			processed.uuid(),
			Some("936ce666-ff3b-4c7a-9674-367fe2120408")
		);
		assert_eq!(processed.signature(), Some("now_this_is_a_signature"));
	}

	#[test]
	fn uuid_must_be_a_string() {
		let mut processed = ProcessedCrash::new();
		processed.insert("uuid", json!(42));
		assert_eq!(processed.uuid(), None);
	}
}
