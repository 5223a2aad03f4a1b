// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration surface for building a crash storage facade.
//!
//! The embedding application owns where configuration comes from; this
//! module only defines the shape. Wire clients for the object-store and
//! column-store variants are injected by the caller (their SDKs live
//! outside this crate), so those sections carry connection parameters for
//! whoever builds the client.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use cairn_crash_core::{RedactionPolicy, DEFAULT_FORBIDDEN_KEYS};

use crate::backend::Backend;
use crate::backends::http_collector::HttpCollectorConfig;
use crate::storage::BlobCrashStorageBuilder;
use crate::transaction::BackoffPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("invalid storage config: {0}")]
	Parse(#[from] toml::de::Error),
}

/// Everything needed to stand up a [`crate::BlobCrashStorage`].
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
	#[serde(default)]
	pub backend: BackendConfig,

	#[serde(default)]
	pub retry: RetryConfig,

	/// Respect the `legacy_processing` throttle flag on saves.
	#[serde(default)]
	pub filter_on_legacy_processing: bool,

	/// Where `get_raw_dumps_as_files` materializes dumps.
	#[serde(default = "default_temp_dir")]
	pub temporary_file_system_storage_path: PathBuf,

	#[serde(default = "default_dump_suffix")]
	pub dump_file_suffix: String,

	/// Dotted key paths removed from processed crashes before exposure.
	#[serde(default = "default_forbidden_keys")]
	pub forbidden_keys: Vec<String>,
}

impl StorageConfig {
	pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(text)?)
	}

	pub fn redaction_policy(&self) -> RedactionPolicy {
		RedactionPolicy::new(self.forbidden_keys.iter().map(String::as_str))
	}

	pub fn backoff_policy(&self) -> BackoffPolicy {
		self.retry.backoff_policy()
	}
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			backend: BackendConfig::default(),
			retry: RetryConfig::default(),
			filter_on_legacy_processing: false,
			temporary_file_system_storage_path: default_temp_dir(),
			dump_file_suffix: default_dump_suffix(),
			forbidden_keys: default_forbidden_keys(),
		}
	}
}

/// Which backend variant to stand up, with its connection parameters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
	#[default]
	Memory,
	ObjectStore {
		host: String,
		#[serde(default = "default_object_store_port")]
		port: u16,
		access_key: String,
		secret_access_key: String,
	},
	ColumnStore {
		host: String,
		#[serde(default = "default_column_store_port")]
		port: u16,
		keyspace: String,
		#[serde(default)]
		user: String,
		#[serde(default)]
		password: String,
	},
	HttpCollector {
		base_url: String,
		#[serde(default = "default_timeout_secs")]
		timeout_secs: u64,
	},
}

impl BackendConfig {
	/// Collector parameters, when this selects the HTTP collector.
	pub fn http_collector(&self) -> Option<HttpCollectorConfig> {
		match self {
			Self::HttpCollector {
				base_url,
				timeout_secs,
			} => Some(HttpCollectorConfig {
				base_url: base_url.clone(),
				timeout: Duration::from_secs(*timeout_secs),
			}),
			_ => None,
		}
	}
}

/// Retry schedule selection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RetryConfig {
	/// Fail fast.
	#[default]
	None,
	/// One retry per delay.
	Limited { delays_ms: Vec<u64> },
	/// Doubling delays capped at `cap_ms`.
	Infinite {
		#[serde(default = "default_initial_ms")]
		initial_ms: u64,
		#[serde(default = "default_cap_ms")]
		cap_ms: u64,
	},
}

impl RetryConfig {
	pub fn backoff_policy(&self) -> BackoffPolicy {
		match self {
			Self::None => BackoffPolicy::None,
			Self::Limited { delays_ms } => BackoffPolicy::limited_millis(delays_ms.iter().copied()),
			Self::Infinite { initial_ms, cap_ms } => BackoffPolicy::Infinite {
				initial: Duration::from_millis(*initial_ms),
				cap: Duration::from_millis(*cap_ms),
			},
		}
	}
}

impl<B: Backend> BlobCrashStorageBuilder<B> {
	/// Applies everything from `config` except the backend selection, which
	/// the caller already made by choosing `B`.
	pub fn configured(self, config: &StorageConfig) -> Self {
		self.backoff(config.backoff_policy())
			.redaction_policy(config.redaction_policy())
			.filter_on_legacy_processing(config.filter_on_legacy_processing)
			.temporary_file_path(&config.temporary_file_system_storage_path)
			.dump_file_suffix(config.dump_file_suffix.clone())
	}
}

fn default_temp_dir() -> PathBuf {
	std::env::temp_dir()
}

fn default_dump_suffix() -> String {
	".dump".to_string()
}

fn default_forbidden_keys() -> Vec<String> {
	DEFAULT_FORBIDDEN_KEYS.iter().map(|key| key.to_string()).collect()
}

fn default_object_store_port() -> u16 {
	80
}

fn default_column_store_port() -> u16 {
	9160
}

fn default_timeout_secs() -> u64 {
	30
}

fn default_initial_ms() -> u64 {
	100
}

fn default_cap_ms() -> u64 {
	30_000
}
