// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The uniform crash storage contract and its blob-backend implementation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::backend::Connection;

use cairn_crash_core::{
	json, AddressingScheme, ArtifactName, CrashError, CrashId, Dump, DumpSet, Partition,
	ProcessedCrash, RawCrash, RedactionPolicy, Redactor,
};

use crate::backend::Backend;
use crate::error::{Result, StorageError};
use crate::pool::{ConnectionPool, Identity};
use crate::transaction::{BackoffPolicy, TransactionExecutor};

/// The uniform facade every storage backend implements.
///
/// Saves are not atomic across artifacts: a reader may observe a crash ID
/// whose raw crash exists while its dumps are still being written. That is
/// "in progress", not corruption; the artifacts of one crash are written as
/// independent operations.
#[async_trait]
pub trait CrashStorage: Send + Sync {
	/// Writes the raw crash record, the `dump_names` index, and one artifact
	/// per dump.
	async fn save_raw_crash(
		&self,
		raw_crash: &RawCrash,
		dumps: &DumpSet,
		crash_id: &CrashId,
	) -> Result<()>;

	/// Writes the processed crash at the key for its `uuid`. Rewrites
	/// replace the whole record.
	async fn save_processed(&self, processed_crash: &ProcessedCrash) -> Result<()>;

	async fn get_raw_crash(&self, crash_id: &CrashId) -> Result<RawCrash>;

	/// One named dump; `None` means the default dump.
	async fn get_raw_dump(&self, crash_id: &CrashId, name: Option<&str>) -> Result<Vec<u8>>;

	/// Every dump listed in the `dump_names` index.
	async fn get_raw_dumps(&self, crash_id: &CrashId) -> Result<DumpSet>;

	/// Materializes every dump as a freshly written temporary file. The
	/// caller owns the files and is responsible for deleting them.
	async fn get_raw_dumps_as_files(
		&self,
		crash_id: &CrashId,
	) -> Result<BTreeMap<String, PathBuf>>;

	/// The processed crash with the redaction policy applied.
	async fn get_processed(&self, crash_id: &CrashId) -> Result<ProcessedCrash>;

	/// The processed crash with no redaction. Controlled-access path for
	/// privileged internal callers only; everything user-facing goes
	/// through [`CrashStorage::get_processed`].
	async fn get_unredacted_processed(&self, crash_id: &CrashId) -> Result<ProcessedCrash>;
}

/// [`CrashStorage`] over any blob [`Backend`] driver.
pub struct BlobCrashStorage<B: Backend> {
	backend: Arc<B>,
	pool: Arc<ConnectionPool<B>>,
	transaction: TransactionExecutor<B>,
	addressing: AddressingScheme,
	redactor: Redactor,
	filter_on_legacy_processing: bool,
	temp_dir: PathBuf,
	dump_file_suffix: String,
}

impl<B: Backend> BlobCrashStorage<B> {
	pub fn builder(backend: B) -> BlobCrashStorageBuilder<B> {
		BlobCrashStorageBuilder::new(backend)
	}

	/// The pool behind this storage, for lifecycle control.
	pub fn pool(&self) -> &Arc<ConnectionPool<B>> {
		&self.pool
	}

	/// Closes every pooled backend connection. Shutdown path.
	pub async fn close(&self) {
		self.pool.close().await;
	}

	async fn submit(&self, partition: &Partition, key: &str, body: Vec<u8>) -> Result<()> {
		let identity = Identity::current();
		let partition = partition.clone();
		let key = key.to_string();
		self.transaction
			.run(&identity, move |conn| {
				let partition = partition.clone();
				let key = key.clone();
				let body = body.clone();
				async move {
					conn.select_partition(&partition).await?;
					conn.put(&partition, &key, &body).await
				}
			})
			.await
	}

	async fn fetch(&self, partition: &Partition, key: &str) -> Result<Vec<u8>> {
		let identity = Identity::current();
		let partition = partition.clone();
		let key = key.to_string();
		self.transaction
			.run(&identity, move |conn| {
				let partition = partition.clone();
				let key = key.clone();
				async move {
					conn.select_partition(&partition).await?;
					conn.get(&partition, &key).await
				}
			})
			.await
	}

	async fn read_dump(&self, dump: &Dump) -> Result<Vec<u8>> {
		match dump {
			Dump::Memory(bytes) => Ok(bytes.clone()),
			Dump::File(path) => tokio::fs::read(path).await.map_err(|source| {
				StorageError::DumpFile {
					path: path.clone(),
					source,
				}
			}),
		}
	}

	fn temp_path(&self, crash_id: &CrashId, dump_name: &str) -> PathBuf {
		self.temp_dir.join(format!(
			"{}.{}.TEMPORARY{}",
			crash_id, dump_name, self.dump_file_suffix
		))
	}
}

#[async_trait]
impl<B: Backend> CrashStorage for BlobCrashStorage<B> {
	#[instrument(skip(self, raw_crash, dumps), fields(crash_id = %crash_id, backend = self.backend.name()))]
	async fn save_raw_crash(
		&self,
		raw_crash: &RawCrash,
		dumps: &DumpSet,
		crash_id: &CrashId,
	) -> Result<()> {
		if self.filter_on_legacy_processing {
			if let Some(flag) = raw_crash.legacy_processing() {
				if flag != 0 {
					debug!(flag, "crash throttled by legacy_processing; save skipped");
					return Ok(());
				}
			}
		}

		// Validate names and stage payloads before the first write so a
		// malformed dump set never leaves a partial artifact behind.
		let mut names = Vec::with_capacity(dumps.len());
		let mut payloads = Vec::with_capacity(dumps.len());
		for (name, dump) in dumps.iter() {
			let artifact = ArtifactName::dump(Some(name))?;
			let body = self.read_dump(dump).await?;
			names.push(artifact.as_str().to_string());
			payloads.push((artifact, body));
		}

		let submitted = raw_crash.submitted_timestamp().and_then(json::parse_timestamp);
		let partition = self.addressing.partition_for_save(crash_id, submitted)?;

		let raw_key = self.addressing.key_of(crash_id, &ArtifactName::RawCrash);
		self.submit(&partition, &raw_key, json::encode_record(raw_crash.as_map())?)
			.await?;

		let index_key = self.addressing.key_of(crash_id, &ArtifactName::DumpNames);
		let index = json::encode_dump_names(names.iter().map(String::as_str))?;
		self.submit(&partition, &index_key, index).await?;

		for (artifact, body) in payloads {
			let key = self.addressing.key_of(crash_id, &artifact);
			self.submit(&partition, &key, body).await?;
		}
		Ok(())
	}

	#[instrument(skip(self, processed_crash), fields(backend = self.backend.name()))]
	async fn save_processed(&self, processed_crash: &ProcessedCrash) -> Result<()> {
		let crash_id = CrashId::from(
			processed_crash
				.uuid()
				.ok_or(CrashError::MissingCrashId)?,
		);
		let partition = self.addressing.partition_of(&crash_id)?;
		let key = self
			.addressing
			.key_of(&crash_id, &ArtifactName::ProcessedCrash);
		self.submit(
			&partition,
			&key,
			json::encode_record(processed_crash.as_map())?,
		)
		.await
	}

	#[instrument(skip(self), fields(crash_id = %crash_id, backend = self.backend.name()))]
	async fn get_raw_crash(&self, crash_id: &CrashId) -> Result<RawCrash> {
		let partition = self.addressing.partition_of(crash_id)?;
		let key = self.addressing.key_of(crash_id, &ArtifactName::RawCrash);
		let bytes = self
			.fetch(&partition, &key)
			.await
			.map_err(|error| error.for_crash(crash_id))?;
		Ok(RawCrash::from(json::decode_record(&bytes)?))
	}

	#[instrument(skip(self), fields(crash_id = %crash_id, backend = self.backend.name()))]
	async fn get_raw_dump(&self, crash_id: &CrashId, name: Option<&str>) -> Result<Vec<u8>> {
		let partition = self.addressing.partition_of(crash_id)?;
		let artifact = ArtifactName::dump(name)?;
		let key = self.addressing.key_of(crash_id, &artifact);
		self.fetch(&partition, &key)
			.await
			.map_err(|error| error.for_crash(crash_id))
	}

	#[instrument(skip(self), fields(crash_id = %crash_id, backend = self.backend.name()))]
	async fn get_raw_dumps(&self, crash_id: &CrashId) -> Result<DumpSet> {
		let partition = self.addressing.partition_of(crash_id)?;
		let index_key = self.addressing.key_of(crash_id, &ArtifactName::DumpNames);
		let index = self
			.fetch(&partition, &index_key)
			.await
			.map_err(|error| error.for_crash(crash_id))?;

		let mut dumps = DumpSet::new();
		for name in json::decode_dump_names(&index)? {
			let artifact = ArtifactName::dump(Some(&name))?;
			let key = self.addressing.key_of(crash_id, &artifact);
			let body = self
				.fetch(&partition, &key)
				.await
				.map_err(|error| error.for_crash(crash_id))?;
			dumps.insert(Some(&name), Dump::Memory(body));
		}
		Ok(dumps)
	}

	#[instrument(skip(self), fields(crash_id = %crash_id, backend = self.backend.name()))]
	async fn get_raw_dumps_as_files(
		&self,
		crash_id: &CrashId,
	) -> Result<BTreeMap<String, PathBuf>> {
		let dumps = self.get_raw_dumps(crash_id).await?;

		let mut written: Vec<PathBuf> = Vec::with_capacity(dumps.len());
		let mut mapping = BTreeMap::new();
		for (name, dump) in dumps.iter() {
			let path = self.temp_path(crash_id, name);
			let body = self.read_dump(dump).await?;
			if let Err(source) = tokio::fs::write(&path, &body).await {
				remove_files(&written).await;
				return Err(StorageError::TempFile { path, source });
			}
			written.push(path.clone());
			mapping.insert(name.to_string(), path);
		}
		Ok(mapping)
	}

	#[instrument(skip(self), fields(crash_id = %crash_id, backend = self.backend.name()))]
	async fn get_processed(&self, crash_id: &CrashId) -> Result<ProcessedCrash> {
		let unredacted = self.get_unredacted_processed(crash_id).await?;
		Ok(self.redactor.redact(&unredacted))
	}

	#[instrument(skip(self), fields(crash_id = %crash_id, backend = self.backend.name()))]
	async fn get_unredacted_processed(&self, crash_id: &CrashId) -> Result<ProcessedCrash> {
		let partition = self.addressing.partition_of(crash_id)?;
		let key = self
			.addressing
			.key_of(crash_id, &ArtifactName::ProcessedCrash);
		let bytes = self
			.fetch(&partition, &key)
			.await
			.map_err(|error| error.for_crash(crash_id))?;
		Ok(ProcessedCrash::from(json::decode_record(&bytes)?))
	}
}

/// Best-effort removal of files a failed materialization already wrote.
async fn remove_files(paths: &[PathBuf]) {
	for path in paths {
		if let Err(error) = tokio::fs::remove_file(path).await {
			debug!(path = %path.display(), %error, "could not remove partial temporary file");
		}
	}
}

/// Builds a [`BlobCrashStorage`] over a backend driver.
pub struct BlobCrashStorageBuilder<B: Backend> {
	backend: B,
	addressing: AddressingScheme,
	redaction: RedactionPolicy,
	backoff: BackoffPolicy,
	retry_conditional: bool,
	filter_on_legacy_processing: bool,
	temp_dir: PathBuf,
	dump_file_suffix: String,
	shutdown: Option<CancellationToken>,
}

impl<B: Backend> BlobCrashStorageBuilder<B> {
	pub fn new(backend: B) -> Self {
		Self {
			backend,
			addressing: AddressingScheme::default(),
			redaction: RedactionPolicy::default(),
			backoff: BackoffPolicy::default(),
			retry_conditional: false,
			filter_on_legacy_processing: false,
			temp_dir: std::env::temp_dir(),
			dump_file_suffix: ".dump".to_string(),
			shutdown: None,
		}
	}

	pub fn addressing(mut self, addressing: AddressingScheme) -> Self {
		self.addressing = addressing;
		self
	}

	pub fn redaction_policy(mut self, policy: RedactionPolicy) -> Self {
		self.redaction = policy;
		self
	}

	pub fn backoff(mut self, policy: BackoffPolicy) -> Self {
		self.backoff = policy;
		self
	}

	pub fn retry_conditional(mut self, retry: bool) -> Self {
		self.retry_conditional = retry;
		self
	}

	pub fn filter_on_legacy_processing(mut self, filter: bool) -> Self {
		self.filter_on_legacy_processing = filter;
		self
	}

	pub fn temporary_file_path(mut self, dir: impl AsRef<Path>) -> Self {
		self.temp_dir = dir.as_ref().to_path_buf();
		self
	}

	pub fn dump_file_suffix(mut self, suffix: impl Into<String>) -> Self {
		self.dump_file_suffix = suffix.into();
		self
	}

	pub fn shutdown(mut self, token: CancellationToken) -> Self {
		self.shutdown = Some(token);
		self
	}

	pub fn build(self) -> BlobCrashStorage<B> {
		let backend = Arc::new(self.backend);
		let pool = Arc::new(ConnectionPool::new(backend.clone()));
		let mut transaction =
			TransactionExecutor::new(backend.clone(), pool.clone(), self.backoff)
				.retry_conditional(self.retry_conditional);
		if let Some(token) = self.shutdown {
			transaction = transaction.with_shutdown(token);
		}
		BlobCrashStorage {
			backend,
			pool,
			transaction,
			addressing: self.addressing,
			redactor: Redactor::new(self.redaction),
			filter_on_legacy_processing: self.filter_on_legacy_processing,
			temp_dir: self.temp_dir,
			dump_file_suffix: self.dump_file_suffix,
		}
	}
}
