// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sending a batch over the network.

use std::time::Duration;

use async_trait::async_trait;
use loom_amplitude_core::Batch;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use tracing::{debug, instrument};

use crate::error::TransportError;

/// User-Agent sent with every batch.
pub const USER_AGENT: &str = concat!("loom-amplitude/", env!("CARGO_PKG_VERSION"));

/// Builds the default HTTP client: agent User-Agent plus a whole-request timeout.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
	Client::builder()
		.user_agent(USER_AGENT)
		.timeout(timeout)
		.build()
}

/// What came back from the endpoint.
///
/// When the request failed before any response arrived this is the default
/// placeholder: no status and an empty body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	pub status: Option<u16>,
	pub body: String,
}

/// Result of one send: whatever response metadata exists, plus the error if
/// the send failed. Both can be present (e.g. a 500 with a body).
#[derive(Debug)]
pub struct DispatchOutcome {
	pub response: ResponseMetadata,
	pub error: Option<TransportError>,
}

impl DispatchOutcome {
	pub fn delivered(response: ResponseMetadata) -> Self {
		Self {
			response,
			error: None,
		}
	}

	/// A failure with no response to show for it.
	pub fn failed(error: TransportError) -> Self {
		Self {
			response: ResponseMetadata::default(),
			error: Some(error),
		}
	}

	pub fn is_success(&self) -> bool {
		self.error.is_none()
	}
}

/// Sends one batch to the collection endpoint.
///
/// Implementations never fail outward: every problem is folded into the
/// returned [`DispatchOutcome`]. The batcher awaits each call before
/// touching the next batch, so at most one send is in flight per agent.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
	async fn send(&self, batch: &Batch) -> DispatchOutcome;
}

/// 2xx and 3xx count as delivered.
pub fn is_success_status(status: u16) -> bool {
	(200..400).contains(&status)
}

/// JSON-over-HTTP transport for the Amplitude batch API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	client: Client,
	endpoint: Url,
	timeout: Duration,
}

impl HttpTransport {
	pub fn new(client: Client, endpoint: Url, timeout: Duration) -> Self {
		Self {
			client,
			endpoint,
			timeout,
		}
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}
}

#[async_trait]
impl Transport for HttpTransport {
	#[instrument(skip_all, fields(endpoint = %self.endpoint, events = batch.len()))]
	async fn send(&self, batch: &Batch) -> DispatchOutcome {
		let body = match batch.to_json() {
			Ok(body) => body,
			Err(e) => return DispatchOutcome::failed(e.into()),
		};

		let response = match self
			.client
			.post(self.endpoint.clone())
			.header(CONTENT_TYPE, "application/json")
			.header(ACCEPT, "*/*")
			.timeout(self.timeout)
			.body(body)
			.send()
			.await
		{
			Ok(response) => response,
			Err(e) => return DispatchOutcome::failed(e.into()),
		};

		let status = response.status().as_u16();
		let body = response.text().await.unwrap_or_default();
		debug!(status, "Batch request completed");

		let metadata = ResponseMetadata {
			status: Some(status),
			body,
		};

		if is_success_status(status) {
			DispatchOutcome::delivered(metadata)
		} else {
			let message = metadata.body.clone();
			DispatchOutcome {
				response: metadata,
				error: Some(TransportError::ServerError { status, message }),
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn success_range_is_2xx_and_3xx() {
		for status in [200, 201, 204, 301, 302, 399] {
			assert!(is_success_status(status), "{status} should succeed");
		}
		for status in [100, 199, 400, 404, 413, 429, 500, 503] {
			assert!(!is_success_status(status), "{status} should fail");
		}
	}

	#[test]
	fn user_agent_carries_crate_version() {
		assert!(USER_AGENT.starts_with("loom-amplitude/"));
		assert!(USER_AGENT.ends_with(env!("CARGO_PKG_VERSION")));
	}

	#[test]
	fn default_client_builds() {
		assert!(http_client(Duration::from_secs(1)).is_ok());
	}

	#[test]
	fn failed_outcome_uses_placeholder_response() {
		let outcome = DispatchOutcome::failed(TransportError::Timeout(Duration::from_secs(1)));
		assert!(!outcome.is_success());
		assert_eq!(outcome.response, ResponseMetadata::default());
		assert_eq!(outcome.response.status, None);
	}
}
