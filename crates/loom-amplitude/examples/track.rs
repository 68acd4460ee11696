// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: send one event through the batching agent and wait for delivery.
//!
//! Run with:
//!   AMPLITUDE_API_KEY=... cargo run --example track -p loom-amplitude -- --user-id 123

use clap::Parser;
use loom_amplitude::{Agent, DispatchReport, Event, Properties};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "track", about = "Send a single event to Amplitude")]
struct Args {
	/// Project API key.
	#[arg(long, env = "AMPLITUDE_API_KEY")]
	api_key: String,

	/// Overrides the collection endpoint.
	#[arg(long, env = "AMPLITUDE_ENDPOINT")]
	endpoint: Option<String>,

	#[arg(long, default_value = "123")]
	user_id: String,

	#[arg(long, default_value = "sample")]
	event_type: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let args = Args::parse();

	let mut builder = Agent::builder()
		.api_key(args.api_key)
		.result_sink(|report: &DispatchReport| match &report.error {
			None => info!(
				events = report.event_count,
				status = ?report.response.status,
				body = %report.response.body,
				"Batch delivered"
			),
			Some(e) => error!(events = report.event_count, error = %e, "Batch failed"),
		});
	if let Some(endpoint) = args.endpoint {
		builder = builder.endpoint(endpoint);
	}
	let agent = builder.build()?;

	let event = Event::new(args.event_type)
		.with_user_id(args.user_id)
		.with_event_properties(Properties::new().with("source", "example"))
		.with_random_insert_id();
	agent.track(event)?;

	agent.close().await?;
	Ok(())
}
