// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pluggable crash artifact storage for Cairn.
//!
//! This crate makes a logical "save/get" on crash artifacts reliable,
//! addressed, and privacy-safe across interchangeable backends:
//!
//! - [`CrashStorage`] is the uniform contract every backend satisfies;
//!   [`BlobCrashStorage`] implements it over any [`Backend`] driver.
//! - [`TransactionExecutor`] wraps each backend operation with
//!   classification-aware retry and backoff.
//! - [`ConnectionPool`] amortizes connection setup across repeated
//!   operations from the same logical caller.
//! - Addressing and redaction come from `cairn-crash-core`.
//!
//! Backend drivers translate their wire SDK's failures into
//! [`BackendError`] at the boundary; nothing backend-specific leaks past
//! the facade. Drivers for an S3-compatible object store, a column store,
//! a remote HTTP collector, and an in-process reference store live in
//! [`backends`].

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod pool;
pub mod storage;
pub mod transaction;

pub use backend::{Backend, BackendError, Connection, FailureClass};
pub use backends::column_store::{ColumnFamilyClient, ColumnStoreBackend};
pub use backends::http_collector::{HttpCollectorBackend, HttpCollectorConfig};
pub use backends::memory::MemoryBackend;
pub use backends::object_store::{ObjectStoreBackend, ObjectStoreClient};
pub use config::{BackendConfig, ConfigError, RetryConfig, StorageConfig};
pub use error::{Result, StorageError};
pub use pool::{ConnectionPool, Identity};
pub use storage::{BlobCrashStorage, BlobCrashStorageBuilder, CrashStorage};
pub use transaction::{BackoffPolicy, TransactionExecutor};
