// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity-keyed connection pooling.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::backend::{Backend, BackendError, Connection};

/// The caller identity a pooled connection is keyed by.
///
/// Identities are explicit tokens passed by callers; [`Identity::current`]
/// derives a default from the calling thread for callers that don't manage
/// their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
	pub fn new(token: impl Into<String>) -> Self {
		Self(token.into())
	}

	/// An identity for the current thread of execution.
	pub fn current() -> Self {
		let thread = std::thread::current();
		match thread.name() {
			Some(name) => Self(name.to_string()),
			None => Self(format!("{:?}", thread.id())),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Amortizes backend connection setup across repeated operations from the
/// same logical caller.
///
/// One identity maps to at most one live connection. The map sits behind a
/// coarse mutex and dialing happens outside it, so one identity's dial never
/// blocks another identity's lookup. A connection is lent to exactly the
/// identity it is keyed by; that exclusivity is by construction (each
/// identity is one caller), not by per-connection locking.
pub struct ConnectionPool<B: Backend> {
	backend: Arc<B>,
	conns: Mutex<HashMap<Identity, Arc<B::Conn>>>,
}

impl<B: Backend> ConnectionPool<B> {
	pub fn new(backend: Arc<B>) -> Self {
		Self {
			backend,
			conns: Mutex::new(HashMap::new()),
		}
	}

	/// The pooled connection for `identity`, dialing one on first use.
	///
	/// Repeated calls with the same identity return the same connection
	/// until it is explicitly closed or forgotten.
	pub async fn connection(&self, identity: &Identity) -> Result<Arc<B::Conn>, BackendError> {
		if let Some(conn) = self.locked().get(identity).cloned() {
			return Ok(conn);
		}
		debug!(backend = self.backend.name(), %identity, "dialing backend connection");
		let conn = Arc::new(self.backend.connect().await?);
		Ok(self
			.locked()
			.entry(identity.clone())
			.or_insert(conn)
			.clone())
	}

	/// Closes the connection for `identity`.
	///
	/// With `forget` the slot is also dropped so the next
	/// [`ConnectionPool::connection`] call dials fresh; without it the slot
	/// stays reserved (close idle, keep slot).
	pub async fn close_connection(
		&self,
		identity: &Identity,
		forget: bool,
	) -> Result<(), BackendError> {
		let conn = if forget {
			self.locked().remove(identity)
		} else {
			self.locked().get(identity).cloned()
		};
		match conn {
			Some(conn) => conn.close().await,
			None => Ok(()),
		}
	}

	/// Closes and forgets every pooled connection. Shutdown path.
	pub async fn close(&self) {
		let drained: Vec<(Identity, Arc<B::Conn>)> = self.locked().drain().collect();
		for (identity, conn) in drained {
			if let Err(error) = conn.close().await {
				warn!(%identity, %error, "closing pooled connection failed");
			}
		}
	}

	/// Forgets every pooled connection without closing it, so every caller's
	/// next [`ConnectionPool::connection`] call dials fresh. Used when a
	/// detected backend-side failure makes existing connections suspect.
	pub fn force_reconnect(&self) {
		self.locked().clear();
	}

	fn locked(&self) -> MutexGuard<'_, HashMap<Identity, Arc<B::Conn>>> {
		self.conns.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	#[cfg(test)]
	pub(crate) fn pooled_count(&self) -> usize {
		self.locked().len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backends::memory::MemoryBackend;

	fn pool() -> ConnectionPool<MemoryBackend> {
		ConnectionPool::new(Arc::new(MemoryBackend::new()))
	}

	#[tokio::test]
	async fn same_identity_gets_the_same_connection() {
		let pool = pool();
		let dwight = Identity::new("dwight");

		let first = pool.connection(&dwight).await.unwrap();
		let second = pool.connection(&dwight).await.unwrap();
		assert!(Arc::ptr_eq(&first, &second));
	}

	#[tokio::test]
	async fn distinct_identities_get_distinct_connections() {
		let pool = pool();

		let a = pool.connection(&Identity::new("dwight")).await.unwrap();
		let b = pool.connection(&Identity::new("wilma")).await.unwrap();
		assert!(!Arc::ptr_eq(&a, &b));
		assert_eq!(pool.pooled_count(), 2);
	}

	#[tokio::test]
	async fn close_without_forget_keeps_the_slot() {
		let pool = pool();
		let dwight = Identity::new("dwight");

		let conn = pool.connection(&dwight).await.unwrap();
		pool.close_connection(&dwight, false).await.unwrap();
		assert_eq!(pool.pooled_count(), 1);
		let again = pool.connection(&dwight).await.unwrap();
		assert!(Arc::ptr_eq(&conn, &again));
	}

	#[tokio::test]
	async fn close_with_forget_drops_the_slot() {
		let pool = pool();
		let dwight = Identity::new("dwight");

		let conn = pool.connection(&dwight).await.unwrap();
		pool.close_connection(&dwight, true).await.unwrap();
		assert_eq!(pool.pooled_count(), 0);
		let fresh = pool.connection(&dwight).await.unwrap();
		assert!(!Arc::ptr_eq(&conn, &fresh));
	}

	#[tokio::test]
	async fn close_drains_everything() {
		let pool = pool();
		pool.connection(&Identity::new("dwight")).await.unwrap();
		pool.connection(&Identity::new("wilma")).await.unwrap();

		pool.close().await;
		assert_eq!(pool.pooled_count(), 0);
	}

	#[tokio::test]
	async fn force_reconnect_forgets_without_closing() {
		let pool = pool();
		let dwight = Identity::new("dwight");

		let before = pool.connection(&dwight).await.unwrap();
		pool.force_reconnect();
		assert_eq!(pool.pooled_count(), 0);
		let after = pool.connection(&dwight).await.unwrap();
		assert!(!Arc::ptr_eq(&before, &after));
	}
}
