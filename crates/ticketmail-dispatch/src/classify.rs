//! Eligibility classification
//!
//! Checks run in a fixed order and the first match is terminal:
//!
//! | check                                  | status                       |
//! |----------------------------------------|------------------------------|
//! | ticket id seen earlier in this batch   | `duplicate_in_batch`         |
//! | prior outcome stored, no force-resend  | `already_processed(when)`    |
//! | requester excluded from notifications  | `excluded_from_survey`       |
//! | requester unknown or without email     | `error("no email found")`    |
//!
//! A ticket passing all checks proceeds to template resolution and transport.

use std::collections::{HashMap, HashSet};

use ticketmail_types::meta_adapter::{Contact, PriorOutcome};
use ticketmail_types::outcome::DispatchStatus;
use ticketmail_types::ticket::TicketData;

pub const NO_EMAIL_FOUND: &str = "no email found";

/// Per-batch classification state. Never shared between batches.
#[derive(Debug, Default)]
pub struct BatchState {
	seen: HashSet<String>,
	prior: HashMap<String, PriorOutcome>,
	force_resend: bool,
}

impl BatchState {
	pub fn new(prior: HashMap<String, PriorOutcome>, force_resend: bool) -> Self {
		Self { seen: HashSet::new(), prior, force_resend }
	}

	/// Batch-level checks. Marks the ticket id as seen.
	pub fn check_batch(&mut self, ticket: &TicketData) -> Option<DispatchStatus> {
		if !self.seen.insert(ticket.ticket_id().to_string()) {
			return Some(DispatchStatus::DuplicateInBatch);
		}
		if self.force_resend {
			return None;
		}
		self.prior.get(ticket.ticket_id()).map(|p| DispatchStatus::AlreadyProcessed(p.timestamp))
	}

	pub fn seen_count(&self) -> usize {
		self.seen.len()
	}
}

/// Requester-level checks, returning the address to notify
pub fn check_requester(contact: Option<&Contact>) -> Result<&str, DispatchStatus> {
	let Some(contact) = contact else {
		return Err(DispatchStatus::Error(NO_EMAIL_FOUND.into()));
	};
	if contact.is_excluded_from_notifications() {
		return Err(DispatchStatus::ExcludedFromSurvey);
	}
	contact.email().ok_or_else(|| DispatchStatus::Error(NO_EMAIL_FOUND.into()))
}


// vim: ts=4
