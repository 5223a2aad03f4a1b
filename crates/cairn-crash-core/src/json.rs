// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Canonical JSON encoding at the artifact boundary.
//!
//! Records cross the boundary as UTF-8 JSON. Datetime-valued fields are
//! stored as `"YYYY-MM-DD HH:MM:SS.ffffff"` strings; incoming records may
//! carry them in RFC 3339 form, so encoding rewrites any string value that
//! parses as RFC 3339 into the stored layout.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::Result;

/// Timestamp layout used inside stored records.
const STORED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Formats a timestamp in the stored layout.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
	ts.format(STORED_TIMESTAMP_FORMAT).to_string()
}

/// Parses an RFC 3339 timestamp string.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(s)
		.ok()
		.map(|ts| ts.with_timezone(&Utc))
}

/// Rewrites every RFC 3339 string value in `value`, recursively, to the
/// stored layout. Strings that do not parse as RFC 3339 are left untouched.
pub fn canonicalize_timestamps(value: &mut Value) {
	match value {
		Value::String(s) => {
			if let Some(ts) = parse_timestamp(s) {
				*s = format_timestamp(&ts);
			}
		}
		Value::Array(items) => {
			for item in items {
				canonicalize_timestamps(item);
			}
		}
		Value::Object(map) => {
			for item in map.values_mut() {
				canonicalize_timestamps(item);
			}
		}
		_ => {}
	}
}

/// Encodes a record for storage: timestamps canonicalized, then JSON.
pub fn encode_record(map: &Map<String, Value>) -> Result<Vec<u8>> {
	let mut value = Value::Object(map.clone());
	canonicalize_timestamps(&mut value);
	Ok(serde_json::to_vec(&value)?)
}

/// Decodes a stored record.
pub fn decode_record(bytes: &[u8]) -> Result<Map<String, Value>> {
	Ok(serde_json::from_slice(bytes)?)
}

/// Encodes the `dump_names` index artifact: a JSON array of strings.
pub fn encode_dump_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Vec<u8>> {
	let names: Vec<&str> = names.into_iter().collect();
	Ok(serde_json::to_vec(&names)?)
}

/// Decodes the `dump_names` index artifact.
pub fn decode_dump_names(bytes: &[u8]) -> Result<Vec<String>> {
	Ok(serde_json::from_slice(bytes)?)
}
