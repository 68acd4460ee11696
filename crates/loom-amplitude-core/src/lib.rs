// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Loom Amplitude agent.
//!
//! This crate holds the data that flows through the agent and nothing that
//! performs I/O:
//!
//! - [`Event`]: one analytics occurrence, serialized with absent fields omitted
//! - [`Properties`]: nested key/value mapping for event and user properties
//! - [`Batch`]: the events gathered at one flush point plus the API key
//! - [`ValidationError`]: rejection of an event missing a required field

pub mod batch;
pub mod error;
pub mod event;
pub mod properties;

pub use batch::{Batch, BatchPayload};
pub use error::ValidationError;
pub use event::Event;
pub use properties::Properties;
