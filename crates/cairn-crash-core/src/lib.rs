// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Cairn crash storage system.
//!
//! This crate provides the record model and the pure algorithms shared by
//! every storage backend. It is consumed by `cairn-crash-storage`, which
//! adds the I/O: pooling, retryable transactions, and the backend drivers.
//!
//! # Overview
//!
//! A crash report is stored as a set of independent artifacts keyed off one
//! [`CrashId`]:
//!
//! - the raw submission metadata ([`RawCrash`]),
//! - zero or more binary memory dumps ([`DumpSet`]) plus a `dump_names`
//!   index listing them,
//! - the analysis record produced downstream ([`ProcessedCrash`]).
//!
//! [`AddressingScheme`] maps `(crash ID, artifact name)` to a deterministic
//! storage location without any lookup table, and [`Redactor`] strips
//! configured sensitive key paths from processed crashes before they leave
//! trusted processing.

pub mod addressing;
pub mod crash_id;
pub mod dump;
pub mod error;
pub mod json;
pub mod processed_crash;
pub mod raw_crash;
pub mod redact;

pub use addressing::{
	AddressingScheme, ArtifactName, Partition, PartitionPolicy, RESERVED_ARTIFACT_NAMES,
};
pub use crash_id::CrashId;
pub use dump::{normalize_dump_name, Dump, DumpSet, DEFAULT_DUMP_FIELD, DEFAULT_DUMP_NAME};
pub use error::{CrashError, Result};
pub use processed_crash::ProcessedCrash;
pub use raw_crash::RawCrash;
pub use redact::{KeyPath, RedactionPolicy, Redactor, DEFAULT_FORBIDDEN_KEYS};
