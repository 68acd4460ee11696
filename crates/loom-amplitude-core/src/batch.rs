// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! A batch of events and its JSON request body.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::event::Event;

const REDACTED: &str = "[REDACTED]";

/// The events gathered at one flush point, in acceptance order, plus the API
/// key that authorises them. A batch is built fresh for every send and
/// dropped once the send attempt finishes.
#[derive(Clone, PartialEq)]
pub struct Batch {
	events: Vec<Event>,
	api_key: Arc<str>,
}

impl Batch {
	pub fn new(events: Vec<Event>, api_key: Arc<str>) -> Self {
		Self { events, api_key }
	}

	pub fn events(&self) -> &[Event] {
		&self.events
	}

	pub fn into_events(self) -> Vec<Event> {
		self.events
	}

	pub fn api_key(&self) -> &str {
		&self.api_key
	}

	pub fn len(&self) -> usize {
		self.events.len()
	}

	pub fn is_empty(&self) -> bool {
		self.events.is_empty()
	}

	/// Borrowed view in the shape the endpoint expects.
	pub fn payload(&self) -> BatchPayload<'_> {
		BatchPayload {
			events: &self.events,
			api_key: &self.api_key,
		}
	}

	/// Serializes the request body: `{"events": [...], "api_key": "..."}`.
	pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
		serde_json::to_vec(&self.payload())
	}
}

impl fmt::Debug for Batch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Batch")
			.field("events", &self.events.len())
			.field("api_key", &REDACTED)
			.finish()
	}
}

/// Request body for one batch.
#[derive(Serialize)]
pub struct BatchPayload<'a> {
	pub events: &'a [Event],
	pub api_key: &'a str,
}
