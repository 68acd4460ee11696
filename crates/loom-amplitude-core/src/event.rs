// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The analytics event record.
//!
//! Every field is optional on the wire. Fields that are unset, or set to an
//! empty string, are left out of the serialized JSON entirely; the collection
//! endpoint treats `null` and `""` differently from "not provided".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::properties::Properties;

fn is_absent(value: &Option<String>) -> bool {
	value.as_deref().map_or(true, str::is_empty)
}

/// One analytics occurrence.
///
/// Build with [`Event::new`] and the `with_*` setters, or with struct
/// update syntax for the device and location metadata:
///
/// ```
/// use loom_amplitude_core::{Event, Properties};
///
/// let event = Event {
///     platform: Some("linux".into()),
///     os_name: Some("debian".into()),
///     ..Event::new("build_started")
/// }
/// .with_user_id("user-42")
/// .with_event_properties(Properties::new().with("target", "release"));
///
/// assert!(event.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
	#[serde(default, skip_serializing_if = "is_absent")]
	pub user_id: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub device_id: Option<String>,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub event_type: String,

	/// Wall-clock time of the occurrence. Never sent as-is: it is converted
	/// into [`Event::timestamp`] by [`Event::normalize_time`] on submission.
	#[serde(skip)]
	pub time: Option<DateTime<Utc>>,
	/// Milliseconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<i64>,

	#[serde(default, skip_serializing_if = "Properties::is_empty")]
	pub event_properties: Properties,
	#[serde(default, skip_serializing_if = "Properties::is_empty")]
	pub user_properties: Properties,

	/// Deduplication key; the endpoint drops repeats with the same id.
	#[serde(default, skip_serializing_if = "is_absent")]
	pub insert_id: Option<String>,

	#[serde(default, skip_serializing_if = "is_absent")]
	pub app_version: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub platform: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub os_name: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub os_version: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub device_brand: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub device_manufacturer: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub device_model: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub device_type: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub carrier: Option<String>,

	#[serde(default, skip_serializing_if = "is_absent")]
	pub country: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub region: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub city: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub dma: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub language: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub revenue: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub lat: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub lon: Option<f64>,

	#[serde(default, skip_serializing_if = "is_absent")]
	pub ip: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub idfa: Option<String>,
	#[serde(default, skip_serializing_if = "is_absent")]
	pub adid: Option<String>,
}

impl Event {
	/// Creates an event of the given type with every other field unset.
	pub fn new(event_type: impl Into<String>) -> Self {
		Self {
			event_type: event_type.into(),
			..Self::default()
		}
	}

	pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
		self.user_id = Some(user_id.into());
		self
	}

	pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
		self.device_id = Some(device_id.into());
		self
	}

	pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
		self.time = Some(time);
		self
	}

	pub fn with_event_properties(mut self, properties: Properties) -> Self {
		self.event_properties = properties;
		self
	}

	pub fn with_user_properties(mut self, properties: Properties) -> Self {
		self.user_properties = properties;
		self
	}

	pub fn with_insert_id(mut self, insert_id: impl Into<String>) -> Self {
		self.insert_id = Some(insert_id.into());
		self
	}

	/// Assigns a random v4 UUID as the deduplication key.
	pub fn with_random_insert_id(self) -> Self {
		self.with_insert_id(Uuid::new_v4().to_string())
	}

	/// Checks the two fields the endpoint cannot accept an event without.
	pub fn validate(&self) -> Result<(), ValidationError> {
		if is_absent(&self.user_id) {
			return Err(ValidationError::MissingField("user_id"));
		}
		if self.event_type.is_empty() {
			return Err(ValidationError::MissingField("event_type"));
		}
		Ok(())
	}

	/// Moves a wall-clock [`Event::time`] into the millisecond
	/// [`Event::timestamp`]. A set `time` always wins over an existing
	/// `timestamp`; without a `time` the event is left untouched.
	pub fn normalize_time(&mut self) {
		if let Some(time) = self.time {
			self.timestamp = Some(time.timestamp_millis());
		}
	}
}
