// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Crash report identifiers.

use std::fmt;

use crate::error::{CrashError, Result};

/// Opaque identifier for one crash report.
///
/// Crash IDs are minted by the collector, never by this system. By
/// convention the trailing six characters encode the UTC submission date as
/// `YYMMDD`; [`CrashId::date_suffix`] validates and exposes that suffix for
/// address partitioning. A crash ID is stable for the lifetime of the crash
/// and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CrashId(String);

impl CrashId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// The trailing `YYMMDD` date suffix.
	pub fn date_suffix(&self) -> Result<&str> {
		let bytes = self.0.as_bytes();
		if bytes.len() < 6 || !bytes[bytes.len() - 6..].iter().all(u8::is_ascii_digit) {
			return Err(CrashError::MalformedCrashId(self.0.clone()));
		}
		Ok(&self.0[self.0.len() - 6..])
	}
}

impl fmt::Display for CrashId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<&str> for CrashId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

impl From<String> for CrashId {
	fn from(id: String) -> Self {
		Self(id)
	}
}
