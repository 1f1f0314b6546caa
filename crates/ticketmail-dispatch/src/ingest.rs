//! Ticket ingestion
//!
//! Turns a tokenized table into validated tickets. Bad rows are reported with
//! their spreadsheet line (header = line 1) and never abort the batch. Only rows
//! that produced a ticket contribute their requester to `unique_usernames`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::prelude::*;
use ticketmail_core::settings::service::SettingsService;
use ticketmail_types::meta_adapter::RequesterDirectory;
use ticketmail_types::ticket::TicketData;

/// Tokenized input table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBatch {
	pub header: Vec<String>,
	pub rows: Vec<Vec<String>>,
}

/// Column names holding each ticket field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
	pub ticket_id: String,
	pub username: String,
	pub ticket_name: String,
	pub created: String,
}

impl Default for FieldMapping {
	fn default() -> Self {
		Self {
			ticket_id: "ticketId".into(),
			username: "username".into(),
			ticket_name: "ticketName".into(),
			created: "created".into(),
		}
	}
}

impl FieldMapping {
	pub async fn load(settings: &SettingsService) -> ClResult<Self> {
		Ok(Self {
			ticket_id: settings.get_string("ingest.field.ticket_id").await?,
			username: settings.get_string("ingest.field.username").await?,
			ticket_name: settings.get_string("ingest.field.ticket_name").await?,
			created: settings.get_string("ingest.field.created").await?,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidRow {
	pub row_number: usize,
	pub raw_data: Vec<String>,
	pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResult {
	pub valid_tickets: Vec<TicketData>,
	pub invalid_rows: Vec<InvalidRow>,
	pub unique_usernames: BTreeSet<String>,
}

impl IngestResult {
	/// Requesters of valid rows the directory cannot reach by email
	pub async fn find_unknown_users(
		&self,
		directory: &dyn RequesterDirectory,
	) -> ClResult<Vec<String>> {
		let usernames: Vec<&str> = self.unique_usernames.iter().map(String::as_str).collect();
		if usernames.is_empty() {
			return Ok(Vec::new());
		}
		let reachable: BTreeSet<String> = directory
			.find_by_usernames(&usernames)
			.await?
			.into_iter()
			.filter(|c| c.email().is_some())
			.map(|c| c.username)
			.collect();

		Ok(self.unique_usernames.iter().filter(|u| !reachable.contains(*u)).cloned().collect())
	}
}

#[derive(Debug, Clone, Copy)]
struct Columns {
	ticket_id: usize,
	username: usize,
	ticket_name: Option<usize>,
	created: Option<usize>,
}

fn find_column(header: &[String], name: &str) -> Option<usize> {
	header.iter().position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
}

fn cell(row: &[String], idx: usize) -> &str {
	row.get(idx).map_or("", |c| c.trim())
}

pub struct Ingestor {
	mapping: FieldMapping,
}

impl Ingestor {
	pub fn new(mapping: FieldMapping) -> Self {
		Self { mapping }
	}

	fn columns(&self, header: &[String]) -> ClResult<Columns> {
		let required = |name: &str| {
			find_column(header, name).ok_or_else(|| {
				Error::ValidationError(format!("required column '{}' missing from header", name))
			})
		};
		Ok(Columns {
			ticket_id: required(&self.mapping.ticket_id)?,
			username: required(&self.mapping.username)?,
			ticket_name: find_column(header, &self.mapping.ticket_name),
			created: find_column(header, &self.mapping.created),
		})
	}

	/// Validate all rows. Fails only if the header lacks a required column.
	pub fn ingest(&self, batch: &RawBatch) -> ClResult<IngestResult> {
		let cols = self.columns(&batch.header)?;
		let mut result = IngestResult::default();

		for (idx, row) in batch.rows.iter().enumerate() {
			let row_number = idx + 2;
			if row.iter().all(|c| c.trim().is_empty()) {
				debug!("Skipping empty row {}", row_number);
				continue;
			}

			let ticket = TicketData::new(
				cell(row, cols.ticket_id),
				cell(row, cols.username),
				cols.ticket_name.map(|i| cell(row, i)),
				cols.created.map(|i| cell(row, i)),
			);
			match ticket {
				Ok(ticket) => {
					result.unique_usernames.insert(ticket.username().to_string());
					result.valid_tickets.push(ticket);
				}
				Err(err) => {
					let reason = match err {
						Error::ValidationError(msg) => msg,
						other => other.to_string(),
					};
					debug!("Invalid row {}: {}", row_number, reason);
					result.invalid_rows.push(InvalidRow {
						row_number,
						raw_data: row.clone(),
						reason,
					});
				}
			}
		}

		info!(
			"Ingested {} tickets, {} invalid rows, {} requesters",
			result.valid_tickets.len(),
			result.invalid_rows.len(),
			result.unique_usernames.len()
		);
		Ok(result)
	}
}


// vim: ts=4
