// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Nested property mappings attached to events.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key/value properties for an event (`event_properties`) or for the user
/// the event belongs to (`user_properties`).
///
/// Serializes as a plain JSON object. An empty set is skipped entirely when
/// it sits on an [`Event`](crate::Event).
///
/// # Example
///
/// ```
/// use loom_amplitude_core::Properties;
///
/// let props = Properties::new()
///     .with("plan", "pro")
///     .with("seats", 12)
///     .with("trial", false);
///
/// assert_eq!(props.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(Map<String, Value>);

impl Properties {
	pub fn new() -> Self {
		Self(Map::new())
	}

	/// Builder-style insert. Later values replace earlier ones for the same key.
	pub fn with<K, V>(mut self, key: K, value: V) -> Self
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.set(key, value);
		self
	}

	/// Inserts a value in place, returning the one it replaced.
	pub fn set<K, V>(&mut self, key: K, value: V) -> Option<Value>
	where
		K: Into<String>,
		V: Into<Value>,
	{
		self.0.insert(key.into(), value.into())
	}

	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.0.remove(key)
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.0.iter()
	}

	/// Copies every entry of `other` into `self`; `other` wins on conflicts.
	pub fn extend_from(&mut self, other: Properties) {
		self.0.extend(other.0);
	}

	/// Interprets a JSON value as properties. Only objects qualify.
	pub fn from_value(value: Value) -> Option<Self> {
		match value {
			Value::Object(map) => Some(Self(map)),
			_ => None,
		}
	}

	pub fn into_value(self) -> Value {
		Value::Object(self.0)
	}
}

impl From<Map<String, Value>> for Properties {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

impl<K, V> FromIterator<(K, V)> for Properties
where
	K: Into<String>,
	V: Into<Value>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(
			iter
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn new_properties_are_empty() {
		let props = Properties::new();
		assert!(props.is_empty());
		assert_eq!(props.len(), 0);
	}

	#[test]
	fn with_replaces_existing_key() {
		let props = Properties::new().with("step", 1).with("step", 2);
		assert_eq!(props.len(), 1);
		assert_eq!(props.get("step"), Some(&Value::from(2)));
	}

	#[test]
	fn set_returns_previous_value() {
		let mut props = Properties::new();
		assert_eq!(props.set("color", "red"), None);
		assert_eq!(props.set("color", "blue"), Some(Value::from("red")));
	}

	#[test]
	fn remove_drops_key() {
		let mut props = Properties::new().with("a", 1).with("b", 2);
		assert_eq!(props.remove("a"), Some(Value::from(1)));
		assert_eq!(props.len(), 1);
		assert!(props.get("a").is_none());
	}

	#[test]
	fn extend_from_prefers_other() {
		let mut base = Properties::new().with("a", 1).with("b", 2);
		base.extend_from(Properties::new().with("b", 20).with("c", 3));

		assert_eq!(base.len(), 3);
		assert_eq!(base.get("b"), Some(&Value::from(20)));
		assert_eq!(base.get("c"), Some(&Value::from(3)));
	}

	#[test]
	fn nested_values_serialize_as_object() {
		let props = Properties::new().with(
			"cart",
			serde_json::json!({"items": [1, 2, 3], "total": 9.5}),
		);

		let json = serde_json::to_value(&props).unwrap();
		assert_eq!(json["cart"]["items"][2], 3);
		assert_eq!(json["cart"]["total"], 9.5);
	}

	#[test]
	fn from_value_rejects_non_objects() {
		assert!(Properties::from_value(Value::from("text")).is_none());
		assert!(Properties::from_value(serde_json::json!([1, 2])).is_none());

		let props = Properties::from_value(serde_json::json!({"k": "v"})).unwrap();
		assert_eq!(props.get("k"), Some(&Value::from("v")));
	}

	#[test]
	fn collects_from_pairs() {
		let props: Properties = vec![("x", 1), ("y", 2)].into_iter().collect();
		assert_eq!(props.len(), 2);
		assert_eq!(props.into_value(), serde_json::json!({"x": 1, "y": 2}));
	}

	proptest! {
		#[test]
		fn len_counts_distinct_keys(keys in proptest::collection::vec("[a-z]{1,8}", 0..24)) {
			let distinct: std::collections::HashSet<_> = keys.iter().cloned().collect();
			let props: Properties = keys.into_iter().map(|k| (k, true)).collect();
			prop_assert_eq!(props.len(), distinct.len());
		}
	}
}
