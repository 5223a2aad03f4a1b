// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for crash storage operations.

use std::path::PathBuf;

use thiserror::Error;

use cairn_crash_core::CrashError;

use crate::backend::BackendError;

/// Errors surfaced by the storage facade.
#[derive(Debug, Error)]
pub enum StorageError {
	/// No artifacts exist for the requested crash ID.
	#[error("crash ID not found: {0}")]
	CrashIdNotFound(String),

	/// A specific artifact key was absent. The facade converts this to
	/// [`StorageError::CrashIdNotFound`] wherever a crash ID is in hand.
	#[error("no object at key {key:?}")]
	KeyNotFound { key: String },

	#[error("backend operation failed after {attempts} attempt(s): {source}")]
	RetriesExhausted { attempts: usize, source: BackendError },

	#[error("backend operation failed: {0}")]
	Backend(BackendError),

	#[error("shutdown requested while retrying a backend operation")]
	ShutdownRequested,

	#[error(transparent)]
	Crash(#[from] CrashError),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("dump file {path:?} could not be read: {source}")]
	DumpFile { path: PathBuf, source: std::io::Error },

	#[error("temporary file {path:?} could not be written: {source}")]
	TempFile { path: PathBuf, source: std::io::Error },
}

impl StorageError {
	/// Whether the failure means "the requested data does not exist".
	pub fn is_not_found(&self) -> bool {
		matches!(
			self,
			Self::CrashIdNotFound(_) | Self::KeyNotFound { .. }
		)
	}

	pub(crate) fn from_not_found(error: BackendError) -> Self {
		match error {
			BackendError::NotFound { key } => Self::KeyNotFound { key },
			other => Self::Backend(other),
		}
	}

	pub(crate) fn for_crash(self, crash_id: &cairn_crash_core::CrashId) -> Self {
		match self {
			Self::KeyNotFound { .. } => Self::CrashIdNotFound(crash_id.to_string()),
			other => other,
		}
	}
}

/// Result type for crash storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
