// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Column-store driver.
//!
//! Partitions map to column families. The driver consumes a narrow
//! wire-client trait; the concrete cluster driver lives behind it.
//! Column-store connections are the expensive kind the pool exists for, so
//! this driver keeps its client handle cheap to clone and leaves dial cost
//! inside the wire client.

use std::sync::Arc;

use async_trait::async_trait;

use cairn_crash_core::Partition;

use crate::backend::{Backend, BackendError, Connection, FailureClass};

/// The minimal column-store surface the driver consumes.
#[async_trait]
pub trait ColumnFamilyClient: Send + Sync + 'static {
	/// Create-or-select the column family writes will land in.
	async fn select_column_family(&self, family: &str) -> Result<(), BackendError>;

	async fn insert(&self, family: &str, row_key: &str, value: &[u8]) -> Result<(), BackendError>;

	async fn fetch(&self, family: &str, row_key: &str) -> Result<Vec<u8>, BackendError>;

	/// Release cluster resources.
	async fn close(&self) -> Result<(), BackendError> {
		Ok(())
	}
}

/// Column-store driver over any [`ColumnFamilyClient`].
pub struct ColumnStoreBackend<C> {
	client: Arc<C>,
}

impl<C: ColumnFamilyClient> ColumnStoreBackend<C> {
	pub fn new(client: C) -> Self {
		Self {
			client: Arc::new(client),
		}
	}
}

/// A handle onto the cluster client.
pub struct ColumnStoreConnection<C> {
	client: Arc<C>,
}

#[async_trait]
impl<C: ColumnFamilyClient> Connection for ColumnStoreConnection<C> {
	async fn select_partition(&self, partition: &Partition) -> Result<(), BackendError> {
		self.client.select_column_family(partition.as_str()).await
	}

	async fn put(&self, partition: &Partition, key: &str, body: &[u8]) -> Result<(), BackendError> {
		self.client.insert(partition.as_str(), key, body).await
	}

	async fn get(&self, partition: &Partition, key: &str) -> Result<Vec<u8>, BackendError> {
		self.client.fetch(partition.as_str(), key).await
	}

	async fn close(&self) -> Result<(), BackendError> {
		self.client.close().await
	}
}

#[async_trait]
impl<C: ColumnFamilyClient> Backend for ColumnStoreBackend<C> {
	type Conn = ColumnStoreConnection<C>;

	fn name(&self) -> &'static str {
		"column_store"
	}

	async fn connect(&self) -> Result<ColumnStoreConnection<C>, BackendError> {
		Ok(ColumnStoreConnection {
			client: self.client.clone(),
		})
	}

	/// Column-family creation races are a retry-eligible condition here:
	/// re-running the whole unit of work re-selects the now-existing family
	/// and replays an idempotent write.
	fn classify(&self, error: &BackendError) -> FailureClass {
		match error {
			BackendError::NotFound { .. } => FailureClass::NotFound,
			BackendError::Timeout(_) | BackendError::ConnectionLost(_) => FailureClass::Operational,
			BackendError::PartitionExists { .. } => FailureClass::Conditional,
			_ => FailureClass::Fatal,
		}
	}
}
