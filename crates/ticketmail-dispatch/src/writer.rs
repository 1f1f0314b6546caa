//! Outcome recording
//!
//! Each outcome is saved on its own. When the save fails, an error record with
//! the same identifying fields is saved instead; when that fails too, the
//! outcome is only returned to the caller and the loss is logged as an error.

use std::sync::Arc;
use std::time::Instant;

use crate::prelude::*;
use ticketmail_core::events::{BatchSummary, DispatchEvent, NotificationSink};
use ticketmail_types::meta_adapter::OutcomeStore;
use ticketmail_types::outcome::{DispatchOutcome, DispatchStatus, OutcomeKind};

pub const SAVE_FAILED_PREFIX: &str = "database save failed - ";

pub struct RecordWriter {
	store: Arc<dyn OutcomeStore>,
	sink: Arc<dyn NotificationSink>,
	summary: BatchSummary,
	started: Instant,
}

impl RecordWriter {
	pub fn new(
		store: Arc<dyn OutcomeStore>,
		sink: Arc<dyn NotificationSink>,
		test_mode: bool,
	) -> Self {
		Self {
			store,
			sink,
			summary: BatchSummary { test_mode, ..BatchSummary::default() },
			started: Instant::now(),
		}
	}

	/// Persist one outcome and notify listeners; returns the outcome as recorded
	pub async fn record(&mut self, outcome: DispatchOutcome) -> DispatchOutcome {
		let outcome = match self.store.save_outcome(&outcome).await {
			Ok(()) => outcome,
			Err(err) => {
				warn!("Saving outcome of ticket {} failed: {}", outcome.ticket_id, err);
				let fallback = outcome
					.with_status(DispatchStatus::Error(format!("{}{}", SAVE_FAILED_PREFIX, err)));
				if let Err(err) = self.store.save_outcome(&fallback).await {
					error!(
						"Outcome of ticket {} is lost, error record not saved either: {} (status was {})",
						fallback.ticket_id, err, outcome.status
					);
					self.summary.unsaved += 1;
				}
				fallback
			}
		};

		info!("Ticket {} ({}): {}", outcome.ticket_id, outcome.username, outcome.status);
		self.count_and_notify(&outcome);
		outcome
	}

	fn count_and_notify(&mut self, outcome: &DispatchOutcome) {
		self.summary.total += 1;
		let ticket_id = outcome.ticket_id.clone();
		let username = outcome.username.clone();
		let event = match outcome.status.kind() {
			OutcomeKind::Sent => {
				self.summary.sent += 1;
				DispatchEvent::Sent {
					ticket_id,
					username,
					recipient: outcome.resolved_email.clone().unwrap_or_default(),
					test_mode: outcome.test_mode,
				}
			}
			OutcomeKind::Skipped => {
				self.summary.skipped += 1;
				DispatchEvent::Skipped { ticket_id, username, reason: outcome.status.to_string() }
			}
			OutcomeKind::Failed => {
				self.summary.failed += 1;
				DispatchEvent::Failed {
					ticket_id,
					username,
					reason: outcome.status.detail().unwrap_or_default(),
				}
			}
		};
		self.sink.notify(event);
	}

	/// Flush the store (best effort) and emit the batch summary
	pub async fn finish(mut self) -> BatchSummary {
		if let Err(err) = self.store.flush().await {
			warn!("Final flush of the outcome store failed: {}", err);
		}
		self.summary.elapsed_ms =
			u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);

		info!(
			"Batch completed: {} tickets, {} sent, {} failed, {} skipped{} in {} ms",
			self.summary.total,
			self.summary.sent,
			self.summary.failed,
			self.summary.skipped,
			if self.summary.test_mode { " (test mode)" } else { "" },
			self.summary.elapsed_ms
		);
		self.sink.notify(DispatchEvent::BatchCompleted(self.summary.clone()));
		self.summary
	}
}

// vim: ts=4
