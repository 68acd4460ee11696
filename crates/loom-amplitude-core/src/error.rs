// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Validation errors for events.

use thiserror::Error;

/// An event was rejected before it reached the queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
	/// A required field is absent or empty.
	#[error("missing required parameter: {0}")]
	MissingField(&'static str),
}
