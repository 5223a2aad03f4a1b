// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deterministic artifact addressing.
//!
//! Every artifact lands at a location derived purely from its crash ID and
//! artifact name, so no backend ever needs a lookup table. Partitions are
//! daily buckets: any one partition stays bounded in size and operators can
//! expire whole days at a time.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::crash_id::CrashId;
use crate::dump::normalize_dump_name;
use crate::error::{CrashError, Result};

/// Artifact names a dump may never use.
pub const RESERVED_ARTIFACT_NAMES: [&str; 3] = ["raw_crash", "dump_names", "processed_crash"];

/// A backend-level grouping (bucket, column family) bounding namespace size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition(String);

impl Partition {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Partition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// One named piece of stored data for a crash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactName {
	RawCrash,
	DumpNames,
	ProcessedCrash,
	/// A memory dump, by normalized name.
	Dump(String),
}

impl ArtifactName {
	/// The dump artifact for a submitted dump name, normalized. Names that
	/// would collide with a reserved artifact are rejected.
	pub fn dump(name: Option<&str>) -> Result<Self> {
		let name = normalize_dump_name(name);
		if RESERVED_ARTIFACT_NAMES.contains(&name.as_str()) {
			return Err(CrashError::ReservedDumpName(name));
		}
		Ok(Self::Dump(name))
	}

	pub fn as_str(&self) -> &str {
		match self {
			Self::RawCrash => "raw_crash",
			Self::DumpNames => "dump_names",
			Self::ProcessedCrash => "processed_crash",
			Self::Dump(name) => name,
		}
	}
}

impl fmt::Display for ArtifactName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// How partitions are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionPolicy {
	/// The trailing `YYMMDD` of the crash ID.
	#[default]
	CrashIdDate,
	/// The submission timestamp carried by the record, for deployments whose
	/// crash IDs are not time-ordered. Reads still derive the partition from
	/// the ID suffix; the two agree whenever IDs are minted from the
	/// submission date.
	SubmittedTimestamp,
}

/// Maps `(crash ID, artifact name)` to a storage location.
#[derive(Debug, Clone, Default)]
pub struct AddressingScheme {
	policy: PartitionPolicy,
}

impl AddressingScheme {
	pub fn new(policy: PartitionPolicy) -> Self {
		Self { policy }
	}

	/// The partition for a crash, from the ID's date suffix.
	pub fn partition_of(&self, crash_id: &CrashId) -> Result<Partition> {
		Ok(Partition(crash_id.date_suffix()?.to_string()))
	}

	/// The partition for a record being written. Honors the timestamp policy
	/// when the record carries a submission timestamp, falling back to the
	/// ID suffix otherwise.
	pub fn partition_for_save(
		&self,
		crash_id: &CrashId,
		submitted: Option<DateTime<Utc>>,
	) -> Result<Partition> {
		match (self.policy, submitted) {
			(PartitionPolicy::SubmittedTimestamp, Some(ts)) => Ok(Self::partition_for_timestamp(ts)),
			_ => self.partition_of(crash_id),
		}
	}

	/// The daily partition for a submission timestamp.
	pub fn partition_for_timestamp(ts: DateTime<Utc>) -> Partition {
		Partition(ts.format("%y%m%d").to_string())
	}

	/// `"{crash_id}.{artifact_name}"`: deterministic, collision-free for
	/// distinct pairs, ASCII, human-greppable.
	pub fn key_of(&self, crash_id: &CrashId, artifact: &ArtifactName) -> String {
		format!("{}.{}", crash_id, artifact)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use proptest::prelude::*;

	#[test]
	fn key_format() {
		let scheme = AddressingScheme::default();
		let id = CrashId::from("0bba929f-8721-460c-dead-a43c20071027");
		assert_eq!(
			scheme.key_of(&id, &ArtifactName::RawCrash),
			"0bba929f-8721-460c-dead-a43c20071027.raw_crash"
		);
		assert_eq!(
			scheme.key_of(&id, &ArtifactName::dump(Some("flash_dump")).unwrap()),
			"0bba929f-8721-460c-dead-a43c20071027.flash_dump"
		);
	}

	#[test]
	fn partition_is_the_date_suffix() {
		let scheme = AddressingScheme::default();
		let id = CrashId::from("0bba929f-8721-460c-dead-a43c20071027");
		assert_eq!(scheme.partition_of(&id).unwrap().as_str(), "071027");
	}

	#[test]
	fn timestamp_policy_wins_on_save_when_available() {
		let scheme = AddressingScheme::new(PartitionPolicy::SubmittedTimestamp);
		let id = CrashId::from("0bba929f-8721-460c-dead-a43c20071027");
		let ts = Utc.with_ymd_and_hms(2013, 1, 9, 22, 21, 18).unwrap();
		assert_eq!(
			scheme.partition_for_save(&id, Some(ts)).unwrap().as_str(),
			"130109"
		);
		assert_eq!(
			scheme.partition_for_save(&id, None).unwrap().as_str(),
			"071027"
		);
	}

	#[test]
	fn reserved_names_are_rejected_as_dumps() {
		for reserved in RESERVED_ARTIFACT_NAMES {
			assert!(matches!(
				ArtifactName::dump(Some(reserved)),
				Err(CrashError::ReservedDumpName(_))
			));
		}
	}

	#[test]
	fn default_dump_normalizes_before_keying() {
		assert_eq!(ArtifactName::dump(None).unwrap().as_str(), "dump");
		assert_eq!(
			ArtifactName::dump(Some("upload_file_minidump")).unwrap().as_str(),
			"dump"
		);
	}

	proptest! {
		#[test]
		fn keys_are_deterministic(id in "[a-f0-9-]{1,30}", name in "[a-z_]{1,12}") {
			let scheme = AddressingScheme::default();
			let crash_id = CrashId::from(id.as_str());
			let artifact = ArtifactName::Dump(name);
			prop_assert_eq!(
				scheme.key_of(&crash_id, &artifact),
				scheme.key_of(&crash_id, &artifact)
			);
		}

		#[test]
		fn ids_sharing_a_suffix_never_collide(prefix_a in "[a-f0-9]{8}", prefix_b in "[a-f0-9]{8}") {
			prop_assume!(prefix_a != prefix_b);
			let scheme = AddressingScheme::default();
			let a = CrashId::new(format!("{prefix_a}-20071027"));
			let b = CrashId::new(format!("{prefix_b}-20071027"));
			prop_assert_eq!(
				scheme.partition_of(&a).unwrap(),
				scheme.partition_of(&b).unwrap()
			);
			prop_assert_ne!(
				scheme.key_of(&a, &ArtifactName::RawCrash),
				scheme.key_of(&b, &ArtifactName::RawCrash)
			);
		}
	}
}
