// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Privacy redaction for processed crashes.
//!
//! Processed crashes carry sensitive material (URLs, emails, user
//! identifiers, exploitability assessments, per-dump analysis blocks) that
//! must not leave trusted processing. The redactor removes a configured set
//! of key paths from a copy of the record; it is advisory filtering, not
//! schema validation, so a path the record does not contain is simply
//! skipped.

use serde_json::{Map, Value};

use crate::processed_crash::ProcessedCrash;

/// Default key paths removed before a processed crash is exposed.
pub const DEFAULT_FORBIDDEN_KEYS: [&str; 8] = [
	"url",
	"email",
	"user_id",
	"exploitability",
	"json_dump.sensitive",
	"upload_file_minidump_flash1.json_dump.sensitive",
	"upload_file_minidump_flash2.json_dump.sensitive",
	"upload_file_minidump_browser.json_dump.sensitive",
];

/// A dotted path naming a key, or a whole subtree, to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
	pub fn segments(&self) -> &[String] {
		&self.0
	}
}

impl From<&str> for KeyPath {
	fn from(dotted: &str) -> Self {
		Self(dotted.split('.').map(str::to_string).collect())
	}
}

impl std::fmt::Display for KeyPath {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0.join("."))
	}
}

/// Ordered set of key paths to remove from a record copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionPolicy {
	paths: Vec<KeyPath>,
}

impl RedactionPolicy {
	pub fn new<'a>(dotted_paths: impl IntoIterator<Item = &'a str>) -> Self {
		Self {
			paths: dotted_paths.into_iter().map(KeyPath::from).collect(),
		}
	}

	/// A policy that removes nothing.
	pub fn empty() -> Self {
		Self { paths: Vec::new() }
	}

	pub fn paths(&self) -> &[KeyPath] {
		&self.paths
	}

	pub fn is_empty(&self) -> bool {
		self.paths.is_empty()
	}
}

impl Default for RedactionPolicy {
	fn default() -> Self {
		Self::new(DEFAULT_FORBIDDEN_KEYS)
	}
}

/// Applies a removal policy to a copy of a processed crash.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
	policy: RedactionPolicy,
}

impl Redactor {
	pub fn new(policy: RedactionPolicy) -> Self {
		Self { policy }
	}

	/// Returns a privacy-safe copy of `processed`.
	///
	/// Only keys named by the policy are removed; a path naming a subtree
	/// removes the whole subtree; everything else is preserved unchanged.
	/// The input record is never modified.
	pub fn redact(&self, processed: &ProcessedCrash) -> ProcessedCrash {
		let mut copy = processed.clone();
		for path in self.policy.paths() {
			remove_path(copy.as_map_mut(), path.segments());
		}
		copy
	}
}

fn remove_path(map: &mut Map<String, Value>, segments: &[String]) {
	match segments {
		[] => {}
		[leaf] => {
			map.remove(leaf);
		}
		[head, rest @ ..] => {
			if let Some(Value::Object(child)) = map.get_mut(head) {
				remove_path(child, rest);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn unredacted_fixture() -> ProcessedCrash {
		let mut processed = ProcessedCrash::new();
		processed.insert("uuid", json!("936ce666-ff3b-4c7a-9674-367fe2120408"));
		processed.insert("signature", json!("now_this_is_a_signature"));
		processed.insert("a", json!({ "b": { "c": 11 } }));
		processed.insert("sensitive", json!({ "x": 2 }));
		processed.insert("not_url", json!("not a url"));
		processed.insert("url", json!("http://very.embarrassing.example"));
		processed.insert("email", json!("lars@example.com"));
		processed.insert("user_id", json!("3333"));
		processed.insert("exploitability", json!("yep"));
		processed.insert("json_dump", json!({ "sensitive": 22, "frames": [] }));
		processed.insert(
			"upload_file_minidump_flash1",
			json!({ "json_dump": { "sensitive": 33 } }),
		);
		processed.insert(
			"upload_file_minidump_browser",
			json!({ "json_dump": { "sensitive": { "exploitable": 55 } } }),
		);
		processed
	}

	#[test]
	fn default_policy_removes_the_forbidden_paths() {
		let redacted = Redactor::default().redact(&unredacted_fixture());

		assert_eq!(redacted.get("url"), None);
		assert_eq!(redacted.get("email"), None);
		assert_eq!(redacted.get("user_id"), None);
		assert_eq!(redacted.get("exploitability"), None);
		assert_eq!(redacted.get("json_dump"), Some(&json!({ "frames": [] })));
		assert_eq!(
			redacted.get("upload_file_minidump_flash1"),
			Some(&json!({ "json_dump": {} }))
		);
		assert_eq!(
			redacted.get("upload_file_minidump_browser"),
			Some(&json!({ "json_dump": {} }))
		);
	}

	#[test]
	fn fields_not_named_by_the_policy_survive() {
		let original = unredacted_fixture();
		let redacted = Redactor::default().redact(&original);

		assert_eq!(redacted.uuid(), original.uuid());
		assert_eq!(redacted.signature(), original.signature());
		assert_eq!(redacted.get("a"), original.get("a"));
		assert_eq!(redacted.get("sensitive"), original.get("sensitive"));
		assert_eq!(redacted.get("not_url"), original.get("not_url"));
	}

	#[test]
	fn redaction_never_adds_keys() {
		let original = unredacted_fixture();
		let redacted = Redactor::default().redact(&original);

		for key in redacted.as_map().keys() {
			assert!(original.as_map().contains_key(key));
		}
	}

	#[test]
	fn empty_policy_is_the_identity() {
		let original = unredacted_fixture();
		let redacted = Redactor::new(RedactionPolicy::empty()).redact(&original);
		assert_eq!(redacted, original);
	}

	#[test]
	fn missing_paths_are_silently_skipped() {
		let mut processed = ProcessedCrash::new();
		processed.insert("signature", json!("sig"));

		let redacted = Redactor::default().redact(&processed);
		assert_eq!(redacted, processed);
	}

	#[test]
	fn input_record_is_untouched() {
		let original = unredacted_fixture();
		let before = original.clone();
		let _ = Redactor::default().redact(&original);
		assert_eq!(original, before);
	}
}
