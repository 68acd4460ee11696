// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client-side event batching for the Amplitude HTTP API.
//!
//! Application code hands events to an [`Agent`]. A single background worker
//! gathers them into batches and POSTs each batch when the buffer fills, when
//! the flush interval passes without activity, or when a caller flushes.
//! Delivery results come back through a [`ResultSink`].
//!
//! - `track`/`submit` never wait: a full queue is reported as
//!   [`AgentError::QueueFull`].
//! - `flush` waits until everything queued before the call has been sent.
//! - `close` flushes, then stops the worker.
//!
//! Failed batches are not retried; their events are dropped after the sink
//! has been told.

mod agent;
mod batcher;
pub mod config;
pub mod error;
pub mod sink;
pub mod transport;

#[cfg(test)]
mod testing;

pub use agent::{Agent, AgentBuilder};
pub use batcher::WorkerState;
pub use config::AgentConfig;
pub use error::{AgentError, Result, TransportError};
pub use sink::{DispatchReason, DispatchReport, NoOpResultSink, ResultSink, SharedResultSink};
pub use transport::{DispatchOutcome, HttpTransport, ResponseMetadata, Transport};

pub use loom_amplitude_core::{Batch, Event, Properties, ValidationError};
