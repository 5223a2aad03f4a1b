// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Remote HTTP collector driver.
//!
//! The collector is connectionless, so the driver acts as its own
//! connection: dialing is free, `supports_transactions` answers false, and
//! commit/rollback stay the default no-ops. Artifacts are exchanged as
//! `PUT`/`GET {base_url}/{partition}/{key}`.

use std::time::Duration;

use async_trait::async_trait;

use cairn_crash_core::Partition;

use crate::backend::{Backend, BackendError, Connection, FailureClass};

/// Connection parameters for a remote collector.
#[derive(Debug, Clone)]
pub struct HttpCollectorConfig {
	pub base_url: String,
	pub timeout: Duration,
}

impl HttpCollectorConfig {
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
			timeout: Duration::from_secs(30),
		}
	}
}

/// Driver submitting artifacts to a remote collector over HTTP.
pub struct HttpCollectorBackend {
	client: reqwest::Client,
	base_url: String,
}

impl HttpCollectorBackend {
	pub fn new(config: &HttpCollectorConfig) -> Result<Self, BackendError> {
		let client = reqwest::Client::builder()
			.timeout(config.timeout)
			.build()
			.map_err(|error| BackendError::Transport(error.to_string()))?;
		Ok(Self {
			client,
			base_url: config.base_url.trim_end_matches('/').to_string(),
		})
	}
}

/// The collector stands in for its own connection.
pub struct HttpCollectorConnection {
	client: reqwest::Client,
	base_url: String,
}

impl HttpCollectorConnection {
	fn url(&self, partition: &Partition, key: &str) -> String {
		format!("{}/{}/{}", self.base_url, partition, key)
	}
}

#[async_trait]
impl Connection for HttpCollectorConnection {
	async fn select_partition(&self, _partition: &Partition) -> Result<(), BackendError> {
		// the collector derives its layout from the request path
		Ok(())
	}

	async fn put(&self, partition: &Partition, key: &str, body: &[u8]) -> Result<(), BackendError> {
		let response = self
			.client
			.put(self.url(partition, key))
			.body(body.to_vec())
			.send()
			.await
			.map_err(map_transport)?;
		check_status(response, key).await.map(|_| ())
	}

	async fn get(&self, partition: &Partition, key: &str) -> Result<Vec<u8>, BackendError> {
		let response = self
			.client
			.get(self.url(partition, key))
			.send()
			.await
			.map_err(map_transport)?;
		let response = check_status(response, key).await?;
		Ok(response
			.bytes()
			.await
			.map_err(map_transport)?
			.to_vec())
	}
}

fn map_transport(error: reqwest::Error) -> BackendError {
	if error.is_timeout() {
		BackendError::Timeout(error.to_string())
	} else if error.is_connect() {
		BackendError::ConnectionLost(error.to_string())
	} else {
		BackendError::Transport(error.to_string())
	}
}

async fn check_status(
	response: reqwest::Response,
	key: &str,
) -> Result<reqwest::Response, BackendError> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}
	if status == reqwest::StatusCode::NOT_FOUND {
		return Err(BackendError::NotFound {
			key: key.to_string(),
		});
	}
	let message = response.text().await.unwrap_or_default();
	Err(BackendError::Status {
		status: status.as_u16(),
		message,
	})
}

#[async_trait]
impl Backend for HttpCollectorBackend {
	type Conn = HttpCollectorConnection;

	fn name(&self) -> &'static str {
		"http_collector"
	}

	async fn connect(&self) -> Result<HttpCollectorConnection, BackendError> {
		Ok(HttpCollectorConnection {
			client: self.client.clone(),
			base_url: self.base_url.clone(),
		})
	}

	/// Collector 5xx responses count as operational: the request can be
	/// replayed against a recovered collector. A 409 is the collector-side
	/// already-exists race.
	fn classify(&self, error: &BackendError) -> FailureClass {
		match error {
			BackendError::NotFound { .. } => FailureClass::NotFound,
			BackendError::Timeout(_) | BackendError::ConnectionLost(_) => FailureClass::Operational,
			BackendError::Status { status, .. } if *status >= 500 => FailureClass::Operational,
			BackendError::Status { status, .. } if *status == 409 => FailureClass::Conditional,
			BackendError::PartitionExists { .. } => FailureClass::Conditional,
			_ => FailureClass::Fatal,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn backend() -> HttpCollectorBackend {
		HttpCollectorBackend::new(&HttpCollectorConfig::new("http://collector.example:8888/"))
			.unwrap()
	}

	#[tokio::test]
	async fn collector_is_its_own_connection() {
		let conn = backend().connect().await.unwrap();
		assert!(!conn.supports_transactions());
		assert_eq!(
			conn.url(&test_partition(), "id.raw_crash"),
			"http://collector.example:8888/071027/id.raw_crash"
		);
	}

	#[test]
	fn server_errors_are_operational() {
		let backend = backend();
		let class = backend.classify(&BackendError::Status {
			status: 503,
			message: String::new(),
		});
		assert_eq!(class, FailureClass::Operational);
	}

	#[test]
	fn conflict_is_conditional_and_client_errors_are_fatal() {
		let backend = backend();
		assert_eq!(
			backend.classify(&BackendError::Status {
				status: 409,
				message: String::new(),
			}),
			FailureClass::Conditional
		);
		assert_eq!(
			backend.classify(&BackendError::Status {
				status: 400,
				message: String::new(),
			}),
			FailureClass::Fatal
		);
	}

	fn test_partition() -> Partition {
		use cairn_crash_core::{AddressingScheme, CrashId};
		AddressingScheme::default()
			.partition_of(&CrashId::from("0bba929f-8721-460c-dead-a43c20071027"))
			.unwrap()
	}
}
