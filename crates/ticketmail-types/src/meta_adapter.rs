//! Adapter traits for the storage collaborators of the dispatch pipeline
//!
//! - `RequesterDirectory`: maps requester usernames to contacts
//! - `OutcomeStore`: append-only dispatch outcomes and the prior-outcome lookup
//! - `TemplateStore`: date-scoped message templates
//! - `SettingsStore`: persisted runtime settings

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::outcome::{DispatchOutcome, DispatchStatus};
use crate::prelude::*;

/// A requester as known to the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
	pub username: String,
	pub email: Option<String>,
	pub display_name: Option<String>,
	#[serde(default)]
	pub excluded_from_notifications: bool,
}

impl Contact {
	pub fn is_excluded_from_notifications(&self) -> bool {
		self.excluded_from_notifications
	}

	/// Email address, if it is usable for sending
	pub fn email(&self) -> Option<&str> {
		self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
	}
}

/// Date-scoped message template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
	pub id: i64,
	pub name: String,
	pub content: String,
	pub valid_from: NaiveDate,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
}

/// Data for creating or replacing a template
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateData {
	pub name: String,
	pub content: String,
	pub valid_from: NaiveDate,
}

/// Earliest stored outcome of a ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorOutcome {
	pub timestamp: Timestamp,
	pub status: DispatchStatus,
}

#[async_trait]
pub trait RequesterDirectory: Debug + Send + Sync {
	async fn find_by_username(&self, username: &str) -> ClResult<Option<Contact>>;

	/// Bulk lookup; unknown usernames are simply absent from the result
	async fn find_by_usernames(&self, usernames: &[&str]) -> ClResult<Vec<Contact>>;
}

#[async_trait]
pub trait OutcomeStore: Debug + Send + Sync {
	/// Earliest outcome per ticket id, for the ids that have one
	async fn find_existing_tickets(
		&self,
		ticket_ids: &[&str],
	) -> ClResult<HashMap<String, PriorOutcome>>;

	/// Persist one outcome in its own unit of work
	async fn save_outcome(&self, outcome: &DispatchOutcome) -> ClResult<()>;

	/// All outcomes of one ticket, oldest first
	async fn list_outcomes(&self, ticket_id: &str) -> ClResult<Vec<DispatchOutcome>>;

	/// Push buffered writes to durable storage
	async fn flush(&self) -> ClResult<()> {
		Ok(())
	}
}

#[async_trait]
pub trait TemplateStore: Debug + Send + Sync {
	/// All templates ordered by `valid_from`, then id
	async fn list_templates(&self) -> ClResult<Vec<Template>>;
	async fn read_template(&self, id: i64) -> ClResult<Template>;
	async fn create_template(&self, data: &TemplateData) -> ClResult<Template>;
	async fn update_template(&self, id: i64, data: &TemplateData) -> ClResult<Template>;
	async fn delete_template(&self, id: i64) -> ClResult<()>;

	/// Template with the smallest `valid_from` that is on or after `date`
	async fn find_template_for_date(&self, date: NaiveDate) -> ClResult<Option<Template>>;

	/// Template with the greatest `valid_from`
	async fn find_latest_template(&self) -> ClResult<Option<Template>>;
}

#[async_trait]
pub trait SettingsStore: Debug + Send + Sync {
	async fn read_setting(&self, name: &str) -> ClResult<Option<serde_json::Value>>;
	async fn update_setting(&self, name: &str, value: Option<serde_json::Value>) -> ClResult<()>;
	async fn list_settings(
		&self,
		prefix: Option<&str>,
	) -> ClResult<HashMap<String, serde_json::Value>>;
}


// vim: ts=4
