// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process reference driver.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use cairn_crash_core::Partition;

use crate::backend::{Backend, BackendError, Connection};

type PartitionMap = HashMap<String, HashMap<String, Vec<u8>>>;

/// Stores artifacts in process memory.
///
/// The reference driver: the test suite runs against it, and it serves
/// single-process deployments that don't need durability.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
	state: Arc<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
	partitions: RwLock<PartitionMap>,
}

impl MemoryState {
	fn read(&self) -> RwLockReadGuard<'_, PartitionMap> {
		self.partitions
			.read()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	fn write(&self) -> RwLockWriteGuard<'_, PartitionMap> {
		self.partitions
			.write()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	/// The keys stored in `partition`, sorted.
	pub fn artifacts_in(&self, partition: &str) -> Vec<String> {
		let mut keys: Vec<String> = self
			.state
			.read()
			.get(partition)
			.map(|objects| objects.keys().cloned().collect())
			.unwrap_or_default();
		keys.sort();
		keys
	}

	/// Partition names currently holding any artifact, sorted.
	pub fn partitions(&self) -> Vec<String> {
		let mut names: Vec<String> = self.state.read().keys().cloned().collect();
		names.sort();
		names
	}
}

/// A handle onto the shared in-memory store.
#[derive(Debug)]
pub struct MemoryConnection {
	state: Arc<MemoryState>,
}

#[async_trait]
impl Connection for MemoryConnection {
	async fn select_partition(&self, partition: &Partition) -> Result<(), BackendError> {
		self.state
			.write()
			.entry(partition.as_str().to_string())
			.or_default();
		Ok(())
	}

	async fn put(&self, partition: &Partition, key: &str, body: &[u8]) -> Result<(), BackendError> {
		self.state
			.write()
			.entry(partition.as_str().to_string())
			.or_default()
			.insert(key.to_string(), body.to_vec());
		Ok(())
	}

	async fn get(&self, partition: &Partition, key: &str) -> Result<Vec<u8>, BackendError> {
		self.state
			.read()
			.get(partition.as_str())
			.and_then(|objects| objects.get(key))
			.cloned()
			.ok_or_else(|| BackendError::NotFound {
				key: key.to_string(),
			})
	}
}

#[async_trait]
impl Backend for MemoryBackend {
	type Conn = MemoryConnection;

	fn name(&self) -> &'static str {
		"memory"
	}

	async fn connect(&self) -> Result<MemoryConnection, BackendError> {
		Ok(MemoryConnection {
			state: self.state.clone(),
		})
	}
}
