//! Ticket records as they enter the dispatch pipeline

use serde::Serialize;

use crate::prelude::*;
use crate::utils::{non_blank, truncate_chars};

/// Maximum stored length of a ticket name, in characters
pub const TICKET_NAME_MAX_CHARS: usize = 50;

/// Maximum length of a ticket id, in characters
pub const TICKET_ID_MAX_CHARS: usize = 64;

/// Check a ticket id: non-empty, bounded, `[A-Za-z0-9._-]` only
pub fn validate_ticket_id(ticket_id: &str) -> ClResult<()> {
	if ticket_id.is_empty() {
		return Err(Error::ValidationError("missing ticket id".into()));
	}
	if ticket_id.chars().count() > TICKET_ID_MAX_CHARS {
		return Err(Error::ValidationError(format!(
			"ticket id longer than {} characters",
			TICKET_ID_MAX_CHARS
		)));
	}
	if let Some(bad) =
		ticket_id.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
	{
		return Err(Error::ValidationError(format!("invalid character '{}' in ticket id", bad)));
	}
	Ok(())
}

/// One closed ticket. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketData {
	ticket_id: String,
	username: String,
	ticket_name: Option<String>,
	/// Raw creation date as it came in, parsed later by the template resolver
	created: Option<String>,
}

impl TicketData {
	/// Validate and build a ticket
	///
	/// Values are trimmed. The ticket name is cut to 50 characters and a blank
	/// name or creation date becomes `None`.
	pub fn new(
		ticket_id: &str,
		username: &str,
		ticket_name: Option<&str>,
		created: Option<&str>,
	) -> ClResult<Self> {
		let ticket_id = ticket_id.trim();
		validate_ticket_id(ticket_id)?;

		let username = non_blank(username)
			.ok_or_else(|| Error::ValidationError("missing username".into()))?;

		Ok(Self {
			ticket_id: ticket_id.to_string(),
			username: username.to_string(),
			ticket_name: ticket_name
				.and_then(non_blank)
				.map(|name| truncate_chars(name, TICKET_NAME_MAX_CHARS).to_string()),
			created: created.and_then(non_blank).map(str::to_string),
		})
	}

	pub fn ticket_id(&self) -> &str {
		&self.ticket_id
	}

	pub fn username(&self) -> &str {
		&self.username
	}

	pub fn ticket_name(&self) -> Option<&str> {
		self.ticket_name.as_deref()
	}

	pub fn created(&self) -> Option<&str> {
		self.created.as_deref()
	}
}


// vim: ts=4
