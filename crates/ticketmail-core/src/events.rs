//! Dispatch notifications
//!
//! The pipeline reports every per-ticket outcome and one summary per batch to
//! a `NotificationSink`. Delivery is fire-and-forget: a sink never fails the
//! caller, and nothing waits for listeners.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::prelude::*;

/// End-of-batch counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
	pub total: usize,
	pub sent: usize,
	pub failed: usize,
	pub skipped: usize,
	/// Outcomes that could not be stored at all, not even as a fallback record
	pub unsaved: usize,
	pub test_mode: bool,
	pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
	Sent { ticket_id: String, username: String, recipient: String, test_mode: bool },
	Skipped { ticket_id: String, username: String, reason: String },
	Failed { ticket_id: String, username: String, reason: String },
	BatchCompleted(BatchSummary),
}

impl DispatchEvent {
	pub fn name(&self) -> &'static str {
		match self {
			DispatchEvent::Sent { .. } => "sent",
			DispatchEvent::Skipped { .. } => "skipped",
			DispatchEvent::Failed { .. } => "failed",
			DispatchEvent::BatchCompleted(_) => "batch_completed",
		}
	}
}

/// Receiver of dispatch notifications
pub trait NotificationSink: Send + Sync {
	fn notify(&self, event: DispatchEvent);
}

/// Configuration
#[derive(Clone, Debug)]
pub struct EventBusConfig {
	/// Events buffered per subscriber before slow subscribers start lagging
	pub buffer_size: usize,
}

impl Default for EventBusConfig {
	fn default() -> Self {
		Self { buffer_size: 256 }
	}
}

/// Broadcasts dispatch events to any number of subscribers
pub struct EventBus {
	sender: broadcast::Sender<DispatchEvent>,
}

impl EventBus {
	pub fn new() -> Self {
		Self::with_config(&EventBusConfig::default())
	}

	pub fn with_config(config: &EventBusConfig) -> Self {
		let (sender, _) = broadcast::channel(config.buffer_size.max(1));
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
		self.sender.subscribe()
	}

	pub fn subscriber_count(&self) -> usize {
		self.sender.receiver_count()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new()
	}
}

impl NotificationSink for EventBus {
	fn notify(&self, event: DispatchEvent) {
		let name = event.name();
		match self.sender.send(event) {
			Ok(n) => debug!("Dispatch event '{}' delivered to {} subscribers", name, n),
			// No subscribers
			Err(_) => debug!("Dispatch event '{}' dropped, nobody is listening", name),
		}
	}
}


// vim: ts=4
