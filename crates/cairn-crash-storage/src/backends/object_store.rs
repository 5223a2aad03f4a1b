// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! S3-compatible object-store driver.
//!
//! The driver consumes a narrow wire-client trait; the concrete SDK lives
//! behind it and translates its own failures into [`BackendError`] variants.
//! Partitions map to buckets. Buckets are created-or-selected on every
//! operation, so a bucket-already-exists race from a concurrent writer is
//! expected: the driver logs it and proceeds with the existing bucket.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use cairn_crash_core::Partition;

use crate::backend::{Backend, BackendError, Connection};

/// The minimal object-store surface the driver consumes.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync + 'static {
	/// Create `bucket`, or fail with [`BackendError::PartitionExists`] when
	/// another writer got there first.
	async fn create_bucket(&self, bucket: &str) -> Result<(), BackendError>;

	async fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), BackendError>;

	async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BackendError>;
}

/// Object-store driver over any [`ObjectStoreClient`].
pub struct ObjectStoreBackend<C> {
	client: Arc<C>,
}

impl<C: ObjectStoreClient> ObjectStoreBackend<C> {
	pub fn new(client: C) -> Self {
		Self {
			client: Arc::new(client),
		}
	}
}

/// A handle onto the wire client.
pub struct ObjectStoreConnection<C> {
	client: Arc<C>,
}

#[async_trait]
impl<C: ObjectStoreClient> Connection for ObjectStoreConnection<C> {
	async fn select_partition(&self, partition: &Partition) -> Result<(), BackendError> {
		match self.client.create_bucket(partition.as_str()).await {
			Err(BackendError::PartitionExists { partition }) => {
				warn!(%partition, "bucket already exists; continuing with the existing one");
				Ok(())
			}
			other => other,
		}
	}

	async fn put(&self, partition: &Partition, key: &str, body: &[u8]) -> Result<(), BackendError> {
		self.client.put_object(partition.as_str(), key, body).await
	}

	async fn get(&self, partition: &Partition, key: &str) -> Result<Vec<u8>, BackendError> {
		self.client.get_object(partition.as_str(), key).await
	}
}

#[async_trait]
impl<C: ObjectStoreClient> Backend for ObjectStoreBackend<C> {
	type Conn = ObjectStoreConnection<C>;

	fn name(&self) -> &'static str {
		"object_store"
	}

	async fn connect(&self) -> Result<ObjectStoreConnection<C>, BackendError> {
		Ok(ObjectStoreConnection {
			client: self.client.clone(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;

	use cairn_crash_core::{AddressingScheme, CrashId};

	/// Wire-client fake that reports the bucket as already existing after
	/// the first create.
	#[derive(Default)]
	struct FakeClient {
		buckets: Mutex<HashMap<String, HashMap<String, Vec<u8>>>>,
		creates: AtomicUsize,
	}

	#[async_trait]
	impl ObjectStoreClient for FakeClient {
		async fn create_bucket(&self, bucket: &str) -> Result<(), BackendError> {
			self.creates.fetch_add(1, Ordering::SeqCst);
			let mut buckets = self.buckets.lock().unwrap();
			if buckets.contains_key(bucket) {
				return Err(BackendError::PartitionExists {
					partition: bucket.to_string(),
				});
			}
			buckets.insert(bucket.to_string(), HashMap::new());
			Ok(())
		}

		async fn put_object(
			&self,
			bucket: &str,
			key: &str,
			body: &[u8],
		) -> Result<(), BackendError> {
			self.buckets
				.lock()
				.unwrap()
				.entry(bucket.to_string())
				.or_default()
				.insert(key.to_string(), body.to_vec());
			Ok(())
		}

		async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BackendError> {
			self.buckets
				.lock()
				.unwrap()
				.get(bucket)
				.and_then(|objects| objects.get(key))
				.cloned()
				.ok_or_else(|| BackendError::NotFound {
					key: key.to_string(),
				})
		}
	}

	fn partition() -> Partition {
		AddressingScheme::default()
			.partition_of(&CrashId::from("0bba929f-8721-460c-dead-a43c20071027"))
			.unwrap()
	}

	#[tokio::test]
	async fn bucket_exists_race_is_absorbed() {
		let backend = ObjectStoreBackend::new(FakeClient::default());
		let conn = backend.connect().await.unwrap();

		conn.select_partition(&partition()).await.unwrap();
		// second create hits the already-exists race and still succeeds
		conn.select_partition(&partition()).await.unwrap();
	}

	#[tokio::test]
	async fn put_and_get_address_the_bucket() {
		let backend = ObjectStoreBackend::new(FakeClient::default());
		let conn = backend.connect().await.unwrap();

		conn.select_partition(&partition()).await.unwrap();
		conn.put(&partition(), "id.dump", b"bytes").await.unwrap();
		assert_eq!(conn.get(&partition(), "id.dump").await.unwrap(), b"bytes");
	}
}
