// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Construction-time settings for the agent.

use std::time::Duration;

use reqwest::Url;

use crate::error::{AgentError, Result};

/// Amplitude HTTP V2 ingestion endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.amplitude.com/2/httpapi";
/// Events the inbound queue holds before `submit` starts failing.
pub const DEFAULT_QUEUE_CAPACITY: usize = 250;
/// Events accumulated before a batch is sent without waiting for the timer.
pub const DEFAULT_BATCH_SIZE: usize = 256;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "AMPLITUDE_API_KEY";
/// Environment variable overriding [`DEFAULT_ENDPOINT`].
pub const ENDPOINT_ENV: &str = "AMPLITUDE_ENDPOINT";

/// Tuning for the queue, the batcher and the transport.
#[derive(Debug, Clone)]
pub struct AgentConfig {
	/// Capacity of the bounded inbound queue.
	pub queue_capacity: usize,
	/// Buffer size at which a batch is dispatched immediately.
	pub batch_size: usize,
	/// Idle time after which a non-empty buffer is dispatched.
	pub flush_interval: Duration,
	/// Deadline for a single send.
	pub request_timeout: Duration,
	/// Where batches are POSTed.
	pub endpoint: String,
}

impl Default for AgentConfig {
	fn default() -> Self {
		Self {
			queue_capacity: DEFAULT_QUEUE_CAPACITY,
			batch_size: DEFAULT_BATCH_SIZE,
			flush_interval: DEFAULT_FLUSH_INTERVAL,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			endpoint: DEFAULT_ENDPOINT.to_string(),
		}
	}
}

impl AgentConfig {
	/// Rejects values the worker cannot run with.
	pub fn validate(&self) -> Result<()> {
		if self.queue_capacity == 0 {
			return Err(AgentError::InvalidConfig(
				"queue_capacity must be greater than zero".to_string(),
			));
		}
		if self.batch_size == 0 {
			return Err(AgentError::InvalidConfig(
				"batch_size must be greater than zero".to_string(),
			));
		}
		if self.flush_interval.is_zero() {
			return Err(AgentError::InvalidConfig(
				"flush_interval must be non-zero".to_string(),
			));
		}
		if self.request_timeout.is_zero() {
			return Err(AgentError::InvalidConfig(
				"request_timeout must be non-zero".to_string(),
			));
		}
		self.endpoint_url().map(|_| ())
	}

	/// Parses [`AgentConfig::endpoint`], accepting only http and https.
	pub fn endpoint_url(&self) -> Result<Url> {
		let url = Url::parse(&self.endpoint)
			.map_err(|e| AgentError::InvalidEndpoint(format!("{}: {e}", self.endpoint)))?;
		match url.scheme() {
			"http" | "https" => Ok(url),
			other => Err(AgentError::InvalidEndpoint(format!(
				"{}: unsupported scheme '{other}'",
				self.endpoint
			))),
		}
	}
}
