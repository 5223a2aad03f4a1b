// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Retryable execution of backend units of work.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::backend::{Backend, BackendError, FailureClass};
use crate::error::StorageError;
use crate::pool::{ConnectionPool, Identity};

/// Backoff schedule for retrying operational failures.
#[derive(Debug, Clone, Default)]
pub enum BackoffPolicy {
	/// No retry: the first failure propagates. The safe default for backends
	/// where a replayed side effect is suspect.
	#[default]
	None,
	/// One retry per listed delay, then give up.
	Limited(Vec<Duration>),
	/// Retry indefinitely, doubling from `initial` up to `cap`.
	Infinite { initial: Duration, cap: Duration },
}

impl BackoffPolicy {
	/// A limited schedule given as milliseconds.
	pub fn limited_millis(delays: impl IntoIterator<Item = u64>) -> Self {
		Self::Limited(delays.into_iter().map(Duration::from_millis).collect())
	}

	fn delays(&self) -> BackoffDelays {
		BackoffDelays {
			policy: self.clone(),
			index: 0,
		}
	}

	/// Total attempts the schedule allows, when bounded.
	fn max_attempts(&self) -> Option<usize> {
		match self {
			Self::None => Some(1),
			Self::Limited(delays) => Some(delays.len() + 1),
			Self::Infinite { .. } => None,
		}
	}
}

/// Iterator over the sleeps between attempts.
struct BackoffDelays {
	policy: BackoffPolicy,
	index: u32,
}

impl Iterator for BackoffDelays {
	type Item = Duration;

	fn next(&mut self) -> Option<Duration> {
		match &self.policy {
			BackoffPolicy::None => None,
			BackoffPolicy::Limited(delays) => {
				let delay = delays.get(self.index as usize).copied();
				self.index = self.index.saturating_add(1);
				delay
			}
			BackoffPolicy::Infinite { initial, cap } => {
				let delay = initial
					.checked_mul(1u32 << self.index.min(31))
					.map_or(*cap, |grown| grown.min(*cap));
				self.index = self.index.saturating_add(1);
				Some(delay)
			}
		}
	}
}

/// Runs units of work against pooled connections, retrying transient
/// failures per policy.
pub struct TransactionExecutor<B: Backend> {
	backend: Arc<B>,
	pool: Arc<ConnectionPool<B>>,
	policy: BackoffPolicy,
	retry_conditional: bool,
	shutdown: Option<CancellationToken>,
}

impl<B: Backend> TransactionExecutor<B> {
	pub fn new(backend: Arc<B>, pool: Arc<ConnectionPool<B>>, policy: BackoffPolicy) -> Self {
		Self {
			backend,
			pool,
			policy,
			retry_conditional: false,
			shutdown: None,
		}
	}

	/// Also retry conditional failures. Only sound when re-running the whole
	/// unit of work past the race is known-safe for this backend.
	pub fn retry_conditional(mut self, retry: bool) -> Self {
		self.retry_conditional = retry;
		self
	}

	/// Cooperative shutdown: a cancelled token aborts the backoff sleep and
	/// surfaces [`StorageError::ShutdownRequested`].
	pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
		self.shutdown = Some(token);
		self
	}

	/// Executes `unit_of_work` with the pooled connection for `identity`.
	///
	/// The unit of work may run more than once, so it must be idempotent:
	/// writing the same bytes at the same key is, a counter increment is
	/// not. Operational failures consume the backoff schedule; each retry
	/// logs a diagnostic, forgets pooled connections, sleeps, and
	/// re-executes. The last failure propagates once the schedule is
	/// exhausted. Conditional failures retry only when configured, and
	/// every other failure is attempted exactly once.
	pub async fn run<T, F, Fut>(&self, identity: &Identity, unit_of_work: F) -> Result<T, StorageError>
	where
		F: Fn(Arc<B::Conn>) -> Fut + Send + Sync,
		Fut: Future<Output = Result<T, BackendError>> + Send,
		T: Send,
	{
		let mut delays = self.policy.delays();
		let max_attempts = self.policy.max_attempts();
		let mut attempts = 0usize;
		loop {
			attempts += 1;
			let error = match self.pool.connection(identity).await {
				Ok(conn) => match unit_of_work(conn).await {
					Ok(value) => return Ok(value),
					Err(error) => error,
				},
				Err(error) => error,
			};

			let class = self.backend.classify(&error);
			let retryable = class == FailureClass::Operational
				|| (self.retry_conditional && class == FailureClass::Conditional);
			if !retryable {
				return Err(match class {
					FailureClass::NotFound => StorageError::from_not_found(error),
					_ => StorageError::Backend(error),
				});
			}

			let Some(delay) = delays.next() else {
				return Err(StorageError::RetriesExhausted {
					attempts,
					source: error,
				});
			};
			match max_attempts {
				Some(total) => warn!(
					backend = self.backend.name(),
					%error,
					attempt = attempts,
					of = total,
					delay_ms = delay.as_millis() as u64,
					"backend connection considered failed; retrying"
				),
				None => warn!(
					backend = self.backend.name(),
					%error,
					attempt = attempts,
					delay_ms = delay.as_millis() as u64,
					"backend connection considered failed; retrying"
				),
			}
			self.pool.force_reconnect();
			if !self.sleep(delay).await {
				return Err(StorageError::ShutdownRequested);
			}
		}
	}

	/// Sleeps for `delay`; false means shutdown was requested instead.
	async fn sleep(&self, delay: Duration) -> bool {
		match &self.shutdown {
			Some(token) => {
				if token.is_cancelled() {
					return false;
				}
				tokio::select! {
					_ = token.cancelled() => false,
					_ = tokio::time::sleep(delay) => true,
				}
			}
			None => {
				tokio::time::sleep(delay).await;
				true
			}
		}
	}
}
