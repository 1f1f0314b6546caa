//! Dispatch outcomes: the terminal, recorded result for one ticket

use serde::{Deserialize, Serialize};

use crate::prelude::*;
use crate::ticket::TicketData;

/// Terminal status of one ticket in one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DispatchStatus {
	Sent,
	Error(String),
	DuplicateInBatch,
	/// Carries the timestamp of the earlier outcome
	AlreadyProcessed(Timestamp),
	ExcludedFromSurvey,
}

/// Coarse grouping used for counters and notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
	Sent,
	Skipped,
	Failed,
}

impl DispatchStatus {
	pub fn tag(&self) -> &'static str {
		match self {
			DispatchStatus::Sent => "sent",
			DispatchStatus::Error(_) => "error",
			DispatchStatus::DuplicateInBatch => "duplicate_in_batch",
			DispatchStatus::AlreadyProcessed(_) => "already_processed",
			DispatchStatus::ExcludedFromSurvey => "excluded_from_survey",
		}
	}

	/// Payload as stored next to the tag
	pub fn detail(&self) -> Option<String> {
		match self {
			DispatchStatus::Error(reason) => Some(reason.clone()),
			DispatchStatus::AlreadyProcessed(ts) => Some(ts.0.to_string()),
			_ => None,
		}
	}

	/// Rebuild a status from its stored tag and detail
	pub fn from_parts(tag: &str, detail: Option<&str>) -> ClResult<Self> {
		match tag {
			"sent" => Ok(DispatchStatus::Sent),
			"error" => Ok(DispatchStatus::Error(detail.unwrap_or_default().to_string())),
			"duplicate_in_batch" => Ok(DispatchStatus::DuplicateInBatch),
			"already_processed" => {
				let ts = detail.and_then(|d| d.parse::<i64>().ok()).ok_or(Error::Parse)?;
				Ok(DispatchStatus::AlreadyProcessed(Timestamp(ts)))
			}
			"excluded_from_survey" => Ok(DispatchStatus::ExcludedFromSurvey),
			_ => Err(Error::ValidationError(format!("unknown dispatch status '{}'", tag))),
		}
	}

	pub fn kind(&self) -> OutcomeKind {
		match self {
			DispatchStatus::Sent => OutcomeKind::Sent,
			DispatchStatus::Error(_) => OutcomeKind::Failed,
			DispatchStatus::DuplicateInBatch
			| DispatchStatus::AlreadyProcessed(_)
			| DispatchStatus::ExcludedFromSurvey => OutcomeKind::Skipped,
		}
	}

	pub fn is_error(&self) -> bool {
		matches!(self, DispatchStatus::Error(_))
	}
}

impl std::fmt::Display for DispatchStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			DispatchStatus::Error(reason) => write!(f, "error({})", reason),
			DispatchStatus::AlreadyProcessed(ts) => write!(f, "already_processed({})", ts),
			other => f.write_str(other.tag()),
		}
	}
}

/// Append-only record of what happened to one ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
	pub ticket_id: String,
	pub username: String,
	pub resolved_email: Option<String>,
	pub subject: String,
	#[serde(flatten)]
	pub status: DispatchStatus,
	pub timestamp: Timestamp,
	pub test_mode: bool,
	pub ticket_name: Option<String>,
	pub ticket_created: Option<String>,
}

impl DispatchOutcome {
	pub fn new(
		ticket: &TicketData,
		resolved_email: Option<String>,
		subject: String,
		status: DispatchStatus,
		test_mode: bool,
	) -> Self {
		Self {
			ticket_id: ticket.ticket_id().to_string(),
			username: ticket.username().to_string(),
			resolved_email,
			subject,
			status,
			timestamp: now(),
			test_mode,
			ticket_name: ticket.ticket_name().map(str::to_string),
			ticket_created: ticket.created().map(str::to_string),
		}
	}

	/// Same identifying fields, new status and timestamp
	pub fn with_status(&self, status: DispatchStatus) -> Self {
		Self { status, timestamp: now(), ..self.clone() }
	}
}


// vim: ts=4
