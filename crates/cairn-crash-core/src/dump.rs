// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Memory-dump attachments and their naming rules.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Canonical stored name for the default dump.
pub const DEFAULT_DUMP_NAME: &str = "dump";

/// Form-field name collectors use for the default dump upload.
pub const DEFAULT_DUMP_FIELD: &str = "upload_file_minidump";

/// Normalizes a submitted dump name to its stored form.
///
/// `None`, the empty string and the collector's default form-field name all
/// mean "the default dump" and normalize to [`DEFAULT_DUMP_NAME`].
pub fn normalize_dump_name(name: Option<&str>) -> String {
	match name {
		None | Some("") | Some(DEFAULT_DUMP_FIELD) => DEFAULT_DUMP_NAME.to_string(),
		Some(other) => other.to_string(),
	}
}

/// One dump payload: bytes already in memory, or a reference to a file the
/// submitter staged on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dump {
	Memory(Vec<u8>),
	File(PathBuf),
}

/// The set of dumps attached to one crash, keyed by normalized name.
///
/// Dump sets are write-once: built at submission time, immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpSet {
	dumps: BTreeMap<String, Dump>,
}

impl DumpSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a dump under its normalized name.
	pub fn insert(&mut self, name: Option<&str>, dump: Dump) {
		self.dumps.insert(normalize_dump_name(name), dump);
	}

	pub fn get(&self, name: &str) -> Option<&Dump> {
		self.dumps.get(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.dumps.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Dump)> {
		self.dumps.iter().map(|(name, dump)| (name.as_str(), dump))
	}

	pub fn len(&self) -> usize {
		self.dumps.len()
	}

	pub fn is_empty(&self) -> bool {
		self.dumps.is_empty()
	}
}
