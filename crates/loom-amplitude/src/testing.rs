// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use loom_amplitude_core::{Batch, Event};
use tokio::sync::{mpsc, Mutex};

use crate::error::TransportError;
use crate::sink::{DispatchReason, DispatchReport, ResultSink};
use crate::transport::{DispatchOutcome, ResponseMetadata, Transport};

/// Records every batch it is handed.
pub(crate) struct RecordingTransport {
	batches: Mutex<Vec<Vec<Event>>>,
	should_fail: AtomicBool,
	delay: Option<Duration>,
}

impl RecordingTransport {
	pub(crate) fn new() -> Self {
		Self {
			batches: Mutex::new(Vec::new()),
			should_fail: AtomicBool::new(false),
			delay: None,
		}
	}

	/// Every send sleeps this long before answering.
	pub(crate) fn with_delay(delay: Duration) -> Self {
		Self {
			delay: Some(delay),
			..Self::new()
		}
	}

	pub(crate) fn set_should_fail(&self, fail: bool) {
		self.should_fail.store(fail, Ordering::SeqCst);
	}

	pub(crate) async fn batches(&self) -> Vec<Vec<Event>> {
		self.batches.lock().await.clone()
	}

	pub(crate) async fn event_types(&self) -> Vec<Vec<String>> {
		self
			.batches
			.lock()
			.await
			.iter()
			.map(|batch| batch.iter().map(|e| e.event_type.clone()).collect())
			.collect()
	}
}

#[async_trait]
impl Transport for RecordingTransport {
	async fn send(&self, batch: &Batch) -> DispatchOutcome {
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		self.batches.lock().await.push(batch.events().to_vec());

		if self.should_fail.load(Ordering::SeqCst) {
			return DispatchOutcome {
				response: ResponseMetadata {
					status: Some(500),
					body: "mock failure".to_string(),
				},
				error: Some(TransportError::ServerError {
					status: 500,
					message: "mock failure".to_string(),
				}),
			};
		}

		DispatchOutcome::delivered(ResponseMetadata {
			status: Some(200),
			body: String::new(),
		})
	}
}

/// A condensed copy of a [`DispatchReport`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SeenReport {
	pub reason: DispatchReason,
	pub event_count: usize,
	pub status: Option<u16>,
	pub error: Option<String>,
}

/// Forwards every report over a channel so tests can await dispatches.
pub(crate) struct ChannelSink {
	tx: mpsc::UnboundedSender<SeenReport>,
}

impl ChannelSink {
	pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<SeenReport>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}
}

impl ResultSink for ChannelSink {
	fn on_dispatch(&self, report: &DispatchReport) {
		let _ = self.tx.send(SeenReport {
			reason: report.reason,
			event_count: report.event_count,
			status: report.response.status,
			error: report.error.as_ref().map(ToString::to_string),
		});
	}
}
