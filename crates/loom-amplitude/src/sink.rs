// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reporting dispatch outcomes back to the application.
//!
//! A [`ResultSink`] is called once per dispatch attempt, on the batcher's own
//! task, right after the transport returns. The next batch is not started
//! until the sink returns, so implementations must be quick. Hand anything
//! slow to another task. A sink must never await `Agent::flush` or
//! `Agent::close`: the worker that would answer is the one running the sink.

use std::fmt;
use std::sync::Arc;

use crate::error::TransportError;
use crate::transport::{DispatchOutcome, ResponseMetadata};

/// What triggered a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchReason {
	/// The flush interval elapsed with events buffered.
	Interval,
	/// The buffer reached the batch size.
	BatchFull,
	/// A caller asked for a flush.
	Flush,
	/// The worker is stopping and drained what was left.
	Shutdown,
}

impl DispatchReason {
	pub fn as_str(&self) -> &'static str {
		match self {
			DispatchReason::Interval => "interval",
			DispatchReason::BatchFull => "batch_full",
			DispatchReason::Flush => "flush",
			DispatchReason::Shutdown => "shutdown",
		}
	}
}

impl fmt::Display for DispatchReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Outcome of one dispatch attempt.
#[derive(Debug)]
pub struct DispatchReport {
	pub reason: DispatchReason,
	/// Number of events in the batch. They are gone either way.
	pub event_count: usize,
	pub response: ResponseMetadata,
	pub error: Option<TransportError>,
}

impl DispatchReport {
	pub(crate) fn new(reason: DispatchReason, event_count: usize, outcome: DispatchOutcome) -> Self {
		Self {
			reason,
			event_count,
			response: outcome.response,
			error: outcome.error,
		}
	}

	pub fn is_success(&self) -> bool {
		self.error.is_none()
	}
}

/// Receives a report for every dispatch.
///
/// Any `Fn(&DispatchReport) + Send + Sync` closure is a sink.
pub trait ResultSink: Send + Sync + 'static {
	fn on_dispatch(&self, report: &DispatchReport);
}

impl<F> ResultSink for F
where
	F: Fn(&DispatchReport) + Send + Sync + 'static,
{
	fn on_dispatch(&self, report: &DispatchReport) {
		self(report)
	}
}

/// Type alias for a shared result sink.
pub type SharedResultSink = Arc<dyn ResultSink>;

/// A sink that discards every report. Used when none is configured; the
/// batcher still logs each outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResultSink;

impl ResultSink for NoOpResultSink {
	fn on_dispatch(&self, _report: &DispatchReport) {}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	fn report(error: Option<TransportError>) -> DispatchReport {
		DispatchReport {
			reason: DispatchReason::Flush,
			event_count: 3,
			response: ResponseMetadata::default(),
			error,
		}
	}

	#[test]
	fn closures_are_sinks() {
		let seen = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&seen);
		let sink: SharedResultSink = Arc::new(move |report: &DispatchReport| {
			counter.fetch_add(report.event_count, Ordering::SeqCst);
		});

		sink.on_dispatch(&report(None));
		sink.on_dispatch(&report(None));

		assert_eq!(seen.load(Ordering::SeqCst), 6);
	}

	#[test]
	fn noop_sink_accepts_reports() {
		NoOpResultSink.on_dispatch(&report(Some(TransportError::Timeout(Duration::from_secs(1)))));
	}

	#[test]
	fn report_success_follows_error() {
		assert!(report(None).is_success());
		assert!(!report(Some(TransportError::Timeout(Duration::from_secs(1)))).is_success());
	}

	#[test]
	fn report_takes_outcome_fields() {
		let outcome = DispatchOutcome::delivered(ResponseMetadata {
			status: Some(200),
			body: "{\"code\":200}".to_string(),
		});
		let report = DispatchReport::new(DispatchReason::BatchFull, 256, outcome);

		assert_eq!(report.reason, DispatchReason::BatchFull);
		assert_eq!(report.event_count, 256);
		assert_eq!(report.response.status, Some(200));
		assert!(report.is_success());
	}

	#[test]
	fn reasons_display_as_snake_case() {
		assert_eq!(DispatchReason::BatchFull.to_string(), "batch_full");
		assert_eq!(DispatchReason::Shutdown.to_string(), "shutdown");
	}
}
