// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The backend driver boundary.
//!
//! [`crate::storage::BlobCrashStorage`] never talks to a wire SDK directly;
//! it consumes the narrow [`Connection`] capability set and lets each
//! [`Backend`] declare how its failures map onto the retry taxonomy.
//! Backends without real transactions satisfy the contract as-is:
//! [`Connection::supports_transactions`] answers false and
//! commit/rollback default to no-ops.

use async_trait::async_trait;
use thiserror::Error;

use cairn_crash_core::Partition;

/// Failures a driver can produce.
///
/// Drivers translate their SDK's failures into these variants at the
/// boundary, so nothing backend-specific crosses it.
#[derive(Debug, Error)]
pub enum BackendError {
	#[error("no object at key {key:?}")]
	NotFound { key: String },

	#[error("partition {partition:?} already exists")]
	PartitionExists { partition: String },

	#[error("operation timed out: {0}")]
	Timeout(String),

	#[error("connection lost: {0}")]
	ConnectionLost(String),

	#[error("backend returned status {status}: {message}")]
	Status { status: u16, message: String },

	#[error("transport error: {0}")]
	Transport(String),

	#[error("invalid payload: {0}")]
	InvalidPayload(String),
}

/// How the executor reacts to a failure, as declared by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
	/// Requested object absent. Surfaced as a typed not-found, never retried.
	NotFound,
	/// Transient network or connection trouble, worth retrying.
	Operational,
	/// A backend-specific race needing case-by-case handling.
	Conditional,
	/// Everything else. Propagates immediately.
	Fatal,
}

/// One live backend connection, lent to a single caller at a time.
#[async_trait]
pub trait Connection: Send + Sync {
	/// Create-or-select the partition the following operations address.
	async fn select_partition(&self, partition: &Partition) -> Result<(), BackendError>;

	/// Write `body` at `key` inside `partition`, replacing any prior value.
	async fn put(&self, partition: &Partition, key: &str, body: &[u8]) -> Result<(), BackendError>;

	/// Read the value at `key` inside `partition`.
	async fn get(&self, partition: &Partition, key: &str) -> Result<Vec<u8>, BackendError>;

	/// Release the underlying resources.
	async fn close(&self) -> Result<(), BackendError> {
		Ok(())
	}

	/// Whether this backend has real transactions.
	fn supports_transactions(&self) -> bool {
		false
	}

	async fn commit(&self) -> Result<(), BackendError> {
		Ok(())
	}

	async fn rollback(&self) -> Result<(), BackendError> {
		Ok(())
	}
}

/// Factory for connections, plus the backend's failure taxonomy.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
	type Conn: Connection + 'static;

	/// Short name used in diagnostics.
	fn name(&self) -> &'static str;

	/// Dial a fresh connection.
	async fn connect(&self) -> Result<Self::Conn, BackendError>;

	/// Classify a failure into the retry taxonomy.
	///
	/// The default covers the common mapping; backends override it to
	/// declare their own operational and conditional sets.
	fn classify(&self, error: &BackendError) -> FailureClass {
		match error {
			BackendError::NotFound { .. } => FailureClass::NotFound,
			BackendError::Timeout(_) | BackendError::ConnectionLost(_) => FailureClass::Operational,
			BackendError::PartitionExists { .. } => FailureClass::Conditional,
			_ => FailureClass::Fatal,
		}
	}
}
