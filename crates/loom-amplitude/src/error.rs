// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Amplitude agent.
//!
//! Errors split by where they surface. [`AgentError`] is returned directly to
//! the caller of `track`, `submit`, `flush` or `close`. [`TransportError`]
//! happens later, on the worker, and only ever reaches the application through
//! the result sink.

use std::time::Duration;

use loom_amplitude_core::ValidationError;
use thiserror::Error;

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Synchronous failures seen by callers of the agent.
#[derive(Debug, Error)]
pub enum AgentError {
	/// The event was rejected before enqueue.
	#[error("event validation failed: {0}")]
	Validation(#[from] ValidationError),

	/// The inbound queue is at capacity; the event was dropped.
	#[error("unable to send event, queue is full")]
	QueueFull,

	/// The agent has been closed or its worker is gone.
	#[error("agent has been shut down")]
	ClientShutdown,

	/// API key is missing or blank.
	#[error("invalid API key: must not be empty")]
	InvalidApiKey,

	/// Endpoint is not an absolute http(s) URL.
	#[error("invalid endpoint URL: {0}")]
	InvalidEndpoint(String),

	/// A configuration value is out of range.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// The agent was built outside a Tokio runtime.
	#[error("agent must be built inside a Tokio runtime")]
	NoRuntime,

	/// The HTTP client could not be constructed.
	#[error("HTTP client construction failed: {0}")]
	RequestFailed(#[from] reqwest::Error),
}

/// Dispatch-time failures, delivered to the result sink.
#[derive(Debug, Error)]
pub enum TransportError {
	/// The batch could not be encoded as JSON.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// The request never produced a response.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// The endpoint answered outside the 2xx-3xx range.
	#[error("non-success status code: {status}")]
	ServerError { status: u16, message: String },

	/// The send did not finish within the per-call deadline.
	#[error("send timed out after {0:?}")]
	Timeout(Duration),
}

impl TransportError {
	/// HTTP status attached to the failure, if the endpoint answered at all.
	pub fn status(&self) -> Option<u16> {
		match self {
			TransportError::ServerError { status, .. } => Some(*status),
			TransportError::RequestFailed(e) => e.status().map(|s| s.as_u16()),
			_ => None,
		}
	}
}
