// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the crash record layer.

use thiserror::Error;

/// Errors raised by the pure crash-record layer.
#[derive(Debug, Error)]
pub enum CrashError {
	#[error("malformed crash ID {0:?}: trailing six characters must be YYMMDD digits")]
	MalformedCrashId(String),

	#[error("processed crash has no uuid field")]
	MissingCrashId,

	#[error("dump name {0:?} collides with a reserved artifact name")]
	ReservedDumpName(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Result type for crash record operations.
pub type Result<T> = std::result::Result<T, CrashError>;
