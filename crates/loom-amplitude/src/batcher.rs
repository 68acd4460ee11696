// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The background worker that turns queued events into batches.
//!
//! One task owns the buffer. Everything else talks to it through channels:
//! events arrive on the bounded inbound queue, flush requests arrive on the
//! control channel carrying a one-shot acknowledgment, and shutdown is a
//! cancellation token. Because nothing else can reach the buffer it needs no
//! lock.

use std::sync::Arc;
use std::time::Duration;

use loom_amplitude_core::{Batch, Event};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::TransportError;
use crate::sink::{DispatchReason, DispatchReport, SharedResultSink};
use crate::transport::{DispatchOutcome, Transport};

/// Lifecycle of the worker, observable through `Agent::state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
	/// Waiting on events, the timer, flush requests or shutdown.
	Running,
	/// A batch is with the transport.
	Draining,
	/// The loop has exited; nothing more will be dispatched.
	Stopped,
}

/// Requests sent from the agent to the worker.
#[derive(Debug)]
pub(crate) enum Control {
	/// Dispatch everything queued so far, then signal the sender.
	Flush(oneshot::Sender<()>),
}

pub(crate) struct Batcher {
	events: mpsc::Receiver<Event>,
	control: mpsc::Receiver<Control>,
	shutdown: CancellationToken,
	state: watch::Sender<WorkerState>,
	buffer: Vec<Event>,
	batch_size: usize,
	flush_interval: Duration,
	request_timeout: Duration,
	api_key: Arc<str>,
	transport: Arc<dyn Transport>,
	sink: SharedResultSink,
}

/// Everything the worker needs apart from its channels.
pub(crate) struct BatcherSettings {
	pub batch_size: usize,
	pub flush_interval: Duration,
	pub request_timeout: Duration,
	pub api_key: Arc<str>,
	pub transport: Arc<dyn Transport>,
	pub sink: SharedResultSink,
}

impl Batcher {
	pub(crate) fn new(
		events: mpsc::Receiver<Event>,
		control: mpsc::Receiver<Control>,
		shutdown: CancellationToken,
		state: watch::Sender<WorkerState>,
		settings: BatcherSettings,
	) -> Self {
		Self {
			events,
			control,
			shutdown,
			state,
			buffer: Vec::with_capacity(settings.batch_size),
			batch_size: settings.batch_size,
			flush_interval: settings.flush_interval,
			request_timeout: settings.request_timeout,
			api_key: settings.api_key,
			transport: settings.transport,
			sink: settings.sink,
		}
	}

	/// Runs until shutdown is signalled or every agent handle is dropped.
	pub(crate) async fn run(mut self) {
		info!(
			batch_size = self.batch_size,
			flush_interval_secs = self.flush_interval.as_secs(),
			"Starting amplitude batcher"
		);

		loop {
			// The timer is re-armed every iteration: it fires only after a
			// full interval without any other input.
			tokio::select! {
				_ = self.shutdown.cancelled() => break,
				_ = tokio::time::sleep(self.flush_interval) => {
					if !self.buffer.is_empty() {
						self.dispatch(DispatchReason::Interval).await;
					}
				}
				received = self.events.recv() => match received {
					Some(event) => self.accept(event).await,
					None => break,
				},
				Some(control) = self.control.recv() => match control {
					Control::Flush(ack) => {
						self.drain_queued().await;
						if !self.buffer.is_empty() {
							self.dispatch(DispatchReason::Flush).await;
						}
						let _ = ack.send(());
					}
				},
			}
		}

		self.stop().await;
	}

	/// Appends one event, dispatching as soon as the buffer is full.
	async fn accept(&mut self, event: Event) {
		self.buffer.push(event);
		if self.buffer.len() >= self.batch_size {
			self.dispatch(DispatchReason::BatchFull).await;
		}
	}

	/// Pulls in the events that were already queued when the flush request
	/// was picked up. The length is read once so producers that keep
	/// submitting cannot hold the flush open indefinitely.
	async fn drain_queued(&mut self) {
		let queued = self.events.len();
		for _ in 0..queued {
			match self.events.try_recv() {
				Ok(event) => self.accept(event).await,
				Err(_) => break,
			}
		}
	}

	/// Final drain: refuse new events, dispatch anything still queued or
	/// buffered, release pending flush callers, then mark the worker stopped.
	async fn stop(&mut self) {
		self.events.close();
		while let Ok(event) = self.events.try_recv() {
			self.accept(event).await;
		}
		if !self.buffer.is_empty() {
			self.dispatch(DispatchReason::Shutdown).await;
		}

		self.control.close();
		while let Ok(Control::Flush(ack)) = self.control.try_recv() {
			let _ = ack.send(());
		}

		self.state.send_replace(WorkerState::Stopped);
		info!("Amplitude batcher stopped");
	}

	/// Sends the buffer as one batch and reports the outcome. The batch is
	/// dropped afterwards whether or not it was delivered.
	async fn dispatch(&mut self, reason: DispatchReason) {
		let events = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.batch_size));
		let batch = Batch::new(events, Arc::clone(&self.api_key));
		let event_count = batch.len();

		self.state.send_replace(WorkerState::Draining);
		debug!(count = event_count, reason = %reason, "Dispatching event batch");

		let outcome =
			match tokio::time::timeout(self.request_timeout, self.transport.send(&batch)).await {
				Ok(outcome) => outcome,
				Err(_) => DispatchOutcome::failed(TransportError::Timeout(self.request_timeout)),
			};

		match &outcome.error {
			None => debug!(
				count = event_count,
				status = ?outcome.response.status,
				"Event batch delivered"
			),
			Some(e) => error!(
				count = event_count,
				status = ?outcome.response.status,
				error = %e,
				"Failed to deliver event batch, events dropped"
			),
		}

		let report = DispatchReport::new(reason, event_count, outcome);
		self.sink.on_dispatch(&report);

		self.state.send_replace(WorkerState::Running);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sink::NoOpResultSink;
	use crate::testing::RecordingTransport;

	struct Harness {
		events: mpsc::Sender<Event>,
		control: mpsc::Sender<Control>,
		shutdown: CancellationToken,
		state: watch::Receiver<WorkerState>,
		transport: Arc<RecordingTransport>,
		batcher: Batcher,
	}

	fn harness(batch_size: usize) -> Harness {
		let (events_tx, events_rx) = mpsc::channel(64);
		let (control_tx, control_rx) = mpsc::channel(4);
		let (state_tx, state_rx) = watch::channel(WorkerState::Running);
		let shutdown = CancellationToken::new();
		let transport = Arc::new(RecordingTransport::new());

		let batcher = Batcher::new(
			events_rx,
			control_rx,
			shutdown.clone(),
			state_tx,
			BatcherSettings {
				batch_size,
				flush_interval: Duration::from_secs(3600),
				request_timeout: Duration::from_secs(5),
				api_key: Arc::from("test-key"),
				transport: transport.clone(),
				sink: Arc::new(NoOpResultSink),
			},
		);

		Harness {
			events: events_tx,
			control: control_tx,
			shutdown,
			state: state_rx,
			transport,
			batcher,
		}
	}

	fn event(n: usize) -> Event {
		Event::new(format!("e{n}")).with_user_id("u1")
	}

	#[tokio::test]
	async fn shutdown_dispatches_queued_events_once() {
		let h = harness(100);
		for n in 0..3 {
			h.events.try_send(event(n)).unwrap();
		}
		h.shutdown.cancel();

		h.batcher.run().await;

		let batches = h.transport.event_types().await;
		assert_eq!(batches, vec![vec!["e0", "e1", "e2"]]);
		assert_eq!(*h.state.borrow(), WorkerState::Stopped);
	}

	#[tokio::test]
	async fn dropped_senders_stop_the_worker() {
		let h = harness(100);
		h.events.try_send(event(0)).unwrap();
		drop(h.events);
		drop(h.control);

		h.batcher.run().await;

		assert_eq!(h.transport.event_types().await, vec![vec!["e0"]]);
		assert_eq!(*h.state.borrow(), WorkerState::Stopped);
	}

	#[tokio::test]
	async fn shutdown_with_nothing_buffered_sends_nothing() {
		let h = harness(100);
		h.shutdown.cancel();

		h.batcher.run().await;

		assert!(h.transport.event_types().await.is_empty());
		assert_eq!(*h.state.borrow(), WorkerState::Stopped);
	}

	#[tokio::test]
	async fn pending_flush_is_acknowledged_on_shutdown() {
		let h = harness(100);
		let (ack_tx, ack_rx) = oneshot::channel();
		h.control.try_send(Control::Flush(ack_tx)).unwrap();
		h.events.try_send(event(0)).unwrap();
		h.shutdown.cancel();

		h.batcher.run().await;

		assert!(ack_rx.await.is_ok());
		let sent: usize = h.transport.event_types().await.iter().map(Vec::len).sum();
		assert_eq!(sent, 1);
	}

	#[tokio::test]
	async fn full_buffers_split_into_ordered_batches() {
		let h = harness(2);
		for n in 0..5 {
			h.events.try_send(event(n)).unwrap();
		}
		h.shutdown.cancel();

		h.batcher.run().await;

		let batches = h.transport.event_types().await;
		let flattened: Vec<_> = batches.iter().flatten().cloned().collect();
		assert_eq!(flattened, vec!["e0", "e1", "e2", "e3", "e4"]);
		assert!(batches.iter().all(|b| b.len() <= 2));
		assert_eq!(batches.last().map(Vec::len), Some(1));
	}
}
