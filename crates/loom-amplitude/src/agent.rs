// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The public agent: validation, non-blocking enqueue, flush and close.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use loom_amplitude_core::Event;
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::batcher::{Batcher, BatcherSettings, Control, WorkerState};
use crate::config::{AgentConfig, API_KEY_ENV, ENDPOINT_ENV};
use crate::error::{AgentError, Result};
use crate::sink::{NoOpResultSink, ResultSink, SharedResultSink};
use crate::transport::{self, HttpTransport, Transport};

/// Flush requests that can wait for the worker at once before `flush` awaits.
const CONTROL_CHANNEL_CAPACITY: usize = 8;

/// Builder for constructing an [`Agent`].
pub struct AgentBuilder {
	api_key: Option<String>,
	config: AgentConfig,
	http_client: Option<reqwest::Client>,
	transport: Option<Arc<dyn Transport>>,
	sink: Option<SharedResultSink>,
}

impl AgentBuilder {
	/// Creates a builder with default settings and no API key.
	pub fn new() -> Self {
		Self {
			api_key: None,
			config: AgentConfig::default(),
			http_client: None,
			transport: None,
			sink: None,
		}
	}

	/// Creates a builder from `AMPLITUDE_API_KEY` and, when set,
	/// `AMPLITUDE_ENDPOINT`. A missing key surfaces from [`AgentBuilder::build`].
	pub fn from_env() -> Self {
		let mut builder = Self::new();
		if let Ok(key) = std::env::var(API_KEY_ENV) {
			builder = builder.api_key(key);
		}
		if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
			builder = builder.endpoint(endpoint);
		}
		builder
	}

	pub fn api_key(mut self, key: impl Into<String>) -> Self {
		self.api_key = Some(key.into());
		self
	}

	/// Replaces every tunable at once.
	pub fn config(mut self, config: AgentConfig) -> Self {
		self.config = config;
		self
	}

	/// Overrides the collection endpoint.
	///
	/// Example: `https://api.eu.amplitude.com/2/httpapi`
	pub fn endpoint(mut self, url: impl Into<String>) -> Self {
		self.config.endpoint = url.into();
		self
	}

	pub fn queue_capacity(mut self, capacity: usize) -> Self {
		self.config.queue_capacity = capacity;
		self
	}

	pub fn batch_size(mut self, size: usize) -> Self {
		self.config.batch_size = size;
		self
	}

	pub fn flush_interval(mut self, interval: Duration) -> Self {
		self.config.flush_interval = interval;
		self
	}

	/// Sets the per-send deadline.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;
		self
	}

	/// Uses a caller-supplied HTTP client for the default transport.
	pub fn http_client(mut self, client: reqwest::Client) -> Self {
		self.http_client = Some(client);
		self
	}

	/// Replaces the HTTP transport entirely. The endpoint and HTTP client
	/// settings are ignored when a transport is supplied.
	pub fn transport(mut self, transport: impl Transport) -> Self {
		self.transport = Some(Arc::new(transport));
		self
	}

	pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Sets where dispatch outcomes are reported. See [`ResultSink`] for the
	/// constraints a sink runs under.
	pub fn result_sink(mut self, sink: impl ResultSink) -> Self {
		self.sink = Some(Arc::new(sink));
		self
	}

	/// Validates the settings and starts the background worker.
	///
	/// Must be called from within a Tokio runtime.
	pub fn build(self) -> Result<Agent> {
		let api_key = self
			.api_key
			.filter(|key| !key.trim().is_empty())
			.ok_or(AgentError::InvalidApiKey)?;
		self.config.validate()?;
		let runtime = Handle::try_current().map_err(|_| AgentError::NoRuntime)?;

		let transport: Arc<dyn Transport> = match self.transport {
			Some(transport) => transport,
			None => {
				let client = match self.http_client {
					Some(client) => client,
					None => transport::http_client(self.config.request_timeout)?,
				};
				Arc::new(HttpTransport::new(
					client,
					self.config.endpoint_url()?,
					self.config.request_timeout,
				))
			}
		};

		let (events_tx, events_rx) = mpsc::channel(self.config.queue_capacity);
		let (control_tx, control_rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
		let (state_tx, state_rx) = watch::channel(WorkerState::Running);
		let shutdown = CancellationToken::new();

		let batcher = Batcher::new(
			events_rx,
			control_rx,
			shutdown.clone(),
			state_tx,
			BatcherSettings {
				batch_size: self.config.batch_size,
				flush_interval: self.config.flush_interval,
				request_timeout: self.config.request_timeout,
				api_key: Arc::from(api_key),
				transport,
				sink: self.sink.unwrap_or_else(|| Arc::new(NoOpResultSink)),
			},
		);
		let worker = runtime.spawn(batcher.run());

		info!(
			endpoint = %self.config.endpoint,
			queue_capacity = self.config.queue_capacity,
			"Amplitude agent initialized"
		);

		Ok(Agent {
			inner: Arc::new(AgentInner {
				events: events_tx,
				control: control_tx,
				shutdown,
				state: state_rx,
				worker: Mutex::new(Some(worker)),
				closed: AtomicBool::new(false),
			}),
		})
	}
}

impl Default for AgentBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct AgentInner {
	events: mpsc::Sender<Event>,
	control: mpsc::Sender<Control>,
	shutdown: CancellationToken,
	state: watch::Receiver<WorkerState>,
	worker: Mutex<Option<JoinHandle<()>>>,
	closed: AtomicBool,
}

/// Batches analytics events and ships them to Amplitude in the background.
///
/// Cloning is cheap; every clone feeds the same worker. Dropping the last
/// clone without calling [`Agent::close`] still dispatches whatever is
/// queued, but nobody waits for it.
///
/// # Example
///
/// ```ignore
/// use loom_amplitude::{Agent, DispatchReport, Event};
///
/// let agent = Agent::builder()
///     .api_key(std::env::var("AMPLITUDE_API_KEY")?)
///     .result_sink(|report: &DispatchReport| {
///         if let Some(err) = &report.error {
///             eprintln!("batch of {} dropped: {err}", report.event_count);
///         }
///     })
///     .build()?;
///
/// agent.track(Event::new("checkout_completed").with_user_id("user-42"))?;
///
/// agent.close().await?;
/// ```
#[derive(Clone)]
pub struct Agent {
	inner: Arc<AgentInner>,
}

impl Agent {
	pub fn builder() -> AgentBuilder {
		AgentBuilder::new()
	}

	/// Validates `user_id` and `event_type`, then enqueues via [`Agent::submit`].
	pub fn track(&self, event: Event) -> Result<()> {
		event.validate()?;
		self.submit(event)
	}

	/// Enqueues without validation. Never waits: a full queue fails with
	/// [`AgentError::QueueFull`] and the event is dropped.
	///
	/// A wall-clock `time` on the event is converted to its millisecond
	/// `timestamp` here.
	pub fn submit(&self, mut event: Event) -> Result<()> {
		if self.inner.closed.load(Ordering::SeqCst) {
			return Err(AgentError::ClientShutdown);
		}

		event.normalize_time();

		self.inner.events.try_send(event).map_err(|e| match e {
			TrySendError::Full(event) => {
				warn!(event_type = %event.event_type, "Dropped event, queue is full");
				AgentError::QueueFull
			}
			TrySendError::Closed(_) => AgentError::ClientShutdown,
		})
	}

	/// Waits until every event queued or buffered before this call has been
	/// handed to the transport. Delivery failures are not returned here; they
	/// go to the result sink.
	pub async fn flush(&self) -> Result<()> {
		let (ack_tx, ack_rx) = oneshot::channel();
		self
			.inner
			.control
			.send(Control::Flush(ack_tx))
			.await
			.map_err(|_| AgentError::ClientShutdown)?;
		ack_rx.await.map_err(|_| AgentError::ClientShutdown)
	}

	/// Flushes, stops the worker and waits for it to exit. Submissions made
	/// after `close` starts are rejected; any that raced in before are still
	/// dispatched before this returns. Closing twice returns
	/// [`AgentError::ClientShutdown`].
	pub async fn close(&self) -> Result<()> {
		if self.inner.closed.swap(true, Ordering::SeqCst) {
			return Err(AgentError::ClientShutdown);
		}

		let flushed = self.flush().await;
		self.inner.shutdown.cancel();

		let worker = self.inner.worker.lock().await.take();
		if let Some(worker) = worker {
			if let Err(e) = worker.await {
				error!(error = %e, "Amplitude batcher task failed");
			}
		}

		info!("Amplitude agent closed");
		flushed
	}

	pub fn state(&self) -> WorkerState {
		*self.inner.state.borrow()
	}

	/// True once [`Agent::close`] has been called.
	pub fn is_closed(&self) -> bool {
		self.inner.closed.load(Ordering::SeqCst)
	}
}
