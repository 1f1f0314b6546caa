//! In-memory collaborators for pipeline tests

#![allow(dead_code, clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ticketmail_core::events::{DispatchEvent, NotificationSink};
use ticketmail_dispatch::writer::SAVE_FAILED_PREFIX;
use ticketmail_dispatch::{Collaborators, DispatchConfig, Dispatcher};
use ticketmail_email::compose::DateLocale;
use ticketmail_email::sender::{EmailMessage, MailTransport};
use ticketmail_email::template::{FallbackTemplate, FallbackTemplateProvider};
use ticketmail_types::error::{ClResult, Error};
use ticketmail_types::meta_adapter::{
	Contact, OutcomeStore, PriorOutcome, RequesterDirectory, Template, TemplateData,
	TemplateStore,
};
use ticketmail_types::outcome::{DispatchOutcome, DispatchStatus};
use ticketmail_types::ticket::TicketData;
use ticketmail_types::types::Timestamp;

pub fn init_logging() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn ticket(id: &str, user: &str, created: Option<&str>) -> TicketData {
	TicketData::new(id, user, Some("Printer jam"), created).unwrap()
}

pub fn date(s: &str) -> NaiveDate {
	NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// Requester directory
//*********************
#[derive(Debug, Default)]
pub struct FakeDirectory {
	pub contacts: Mutex<HashMap<String, Contact>>,
	pub fail_bulk: bool,
}

impl FakeDirectory {
	pub fn add(&self, username: &str, email: Option<&str>, excluded: bool) {
		self.contacts.lock().insert(
			username.into(),
			Contact {
				username: username.into(),
				email: email.map(str::to_string),
				display_name: None,
				excluded_from_notifications: excluded,
			},
		);
	}
}

#[async_trait]
impl RequesterDirectory for FakeDirectory {
	async fn find_by_username(&self, username: &str) -> ClResult<Option<Contact>> {
		Ok(self.contacts.lock().get(username).cloned())
	}

	async fn find_by_usernames(&self, usernames: &[&str]) -> ClResult<Vec<Contact>> {
		if self.fail_bulk {
			return Err(Error::DbError);
		}
		let contacts = self.contacts.lock();
		Ok(usernames.iter().filter_map(|u| contacts.get(*u).cloned()).collect())
	}
}

// Outcome store
//***************
#[derive(Debug, Default)]
pub struct FakeOutcomes {
	pub saved: Mutex<Vec<DispatchOutcome>>,
	pub prior: HashMap<String, PriorOutcome>,
	pub fail_lookup: bool,
	/// Primary save fails, the error record is accepted
	pub failing_tickets: HashSet<String>,
	/// Every save fails
	pub lost_tickets: HashSet<String>,
	pub flushes: Mutex<usize>,
}

impl FakeOutcomes {
	pub fn with_prior(ticket_id: &str, ts: i64) -> Self {
		let mut store = Self::default();
		store.prior.insert(
			ticket_id.into(),
			PriorOutcome { timestamp: Timestamp(ts), status: DispatchStatus::Sent },
		);
		store
	}

	pub fn saved(&self) -> Vec<DispatchOutcome> {
		self.saved.lock().clone()
	}
}

#[async_trait]
impl OutcomeStore for FakeOutcomes {
	async fn find_existing_tickets(
		&self,
		ticket_ids: &[&str],
	) -> ClResult<HashMap<String, PriorOutcome>> {
		if self.fail_lookup {
			return Err(Error::DbError);
		}
		Ok(ticket_ids
			.iter()
			.filter_map(|id| self.prior.get(*id).map(|p| ((*id).to_string(), p.clone())))
			.collect())
	}

	async fn save_outcome(&self, outcome: &DispatchOutcome) -> ClResult<()> {
		if self.lost_tickets.contains(&outcome.ticket_id) {
			return Err(Error::ServiceUnavailable("disk full".into()));
		}
		let is_fallback = matches!(&outcome.status, DispatchStatus::Error(r) if r.starts_with(SAVE_FAILED_PREFIX));
		if self.failing_tickets.contains(&outcome.ticket_id) && !is_fallback {
			return Err(Error::ServiceUnavailable("constraint violated".into()));
		}
		self.saved.lock().push(outcome.clone());
		Ok(())
	}

	async fn list_outcomes(&self, ticket_id: &str) -> ClResult<Vec<DispatchOutcome>> {
		Ok(self.saved.lock().iter().filter(|o| o.ticket_id == ticket_id).cloned().collect())
	}

	async fn flush(&self) -> ClResult<()> {
		*self.flushes.lock() += 1;
		Ok(())
	}
}

// Template store
//****************
#[derive(Debug, Default)]
pub struct FakeTemplates {
	pub templates: Mutex<Vec<Template>>,
}

impl FakeTemplates {
	pub fn with(entries: &[(&str, &str)]) -> Self {
		let store = Self::default();
		for (i, (valid_from, content)) in entries.iter().enumerate() {
			store.templates.lock().push(Template {
				id: i64::try_from(i).unwrap() + 1,
				name: format!("from {}", valid_from),
				content: (*content).to_string(),
				valid_from: date(valid_from),
				created_at: Timestamp(0),
				updated_at: Timestamp(0),
			});
		}
		store
	}
}

#[async_trait]
impl TemplateStore for FakeTemplates {
	async fn list_templates(&self) -> ClResult<Vec<Template>> {
		let mut list = self.templates.lock().clone();
		list.sort_by_key(|t| (t.valid_from, t.id));
		Ok(list)
	}
	async fn read_template(&self, id: i64) -> ClResult<Template> {
		self.templates.lock().iter().find(|t| t.id == id).cloned().ok_or(Error::NotFound)
	}
	async fn create_template(&self, _data: &TemplateData) -> ClResult<Template> {
		Err(Error::Internal("not supported".into()))
	}
	async fn update_template(&self, _id: i64, _data: &TemplateData) -> ClResult<Template> {
		Err(Error::Internal("not supported".into()))
	}
	async fn delete_template(&self, _id: i64) -> ClResult<()> {
		Err(Error::Internal("not supported".into()))
	}
	async fn find_template_for_date(&self, date: NaiveDate) -> ClResult<Option<Template>> {
		Ok(self
			.templates
			.lock()
			.iter()
			.filter(|t| t.valid_from >= date)
			.min_by_key(|t| (t.valid_from, std::cmp::Reverse(t.id)))
			.cloned())
	}
	async fn find_latest_template(&self) -> ClResult<Option<Template>> {
		Ok(self.templates.lock().iter().max_by_key(|t| (t.valid_from, t.id)).cloned())
	}
}

pub struct NoFallback;

impl FallbackTemplateProvider for NoFallback {
	fn fallback_template(&self) -> Option<FallbackTemplate> {
		None
	}
}

// Transport
//***********
#[derive(Debug, Default)]
pub struct FakeTransport {
	pub sent: Mutex<Vec<EmailMessage>>,
	pub rejected_recipients: HashSet<String>,
}

impl FakeTransport {
	pub fn sent(&self) -> Vec<EmailMessage> {
		self.sent.lock().clone()
	}
}

#[async_trait]
impl MailTransport for FakeTransport {
	async fn send(&self, message: &EmailMessage) -> ClResult<()> {
		if self.rejected_recipients.contains(&message.to) {
			return Err(Error::ServiceUnavailable("SMTP send failed: 550 mailbox unavailable".into()));
		}
		self.sent.lock().push(message.clone());
		Ok(())
	}
}

// Notifications
//***************
#[derive(Debug, Default)]
pub struct RecordingSink {
	pub events: Mutex<Vec<DispatchEvent>>,
}

impl RecordingSink {
	pub fn names(&self) -> Vec<&'static str> {
		self.events.lock().iter().map(DispatchEvent::name).collect()
	}
}

impl NotificationSink for RecordingSink {
	fn notify(&self, event: DispatchEvent) {
		self.events.lock().push(event);
	}
}

// Harness
//*********
pub struct Harness {
	pub directory: Arc<FakeDirectory>,
	pub outcomes: Arc<FakeOutcomes>,
	pub templates: Arc<FakeTemplates>,
	pub transport: Arc<FakeTransport>,
	pub sink: Arc<RecordingSink>,
	pub config: DispatchConfig,
}

impl Default for Harness {
	fn default() -> Self {
		Self::new(FakeOutcomes::default())
	}
}

impl Harness {
	pub fn new(outcomes: FakeOutcomes) -> Self {
		init_logging();
		let directory = FakeDirectory::default();
		directory.add("alice", Some("alice@example.com"), false);
		directory.add("bob", Some("bob@example.com"), false);
		directory.add("carol", Some("carol@example.com"), true);
		directory.add("dave", None, false);
		Self {
			directory: Arc::new(directory),
			outcomes: Arc::new(outcomes),
			templates: Arc::new(FakeTemplates::with(&[
				("2026-02-03", "early {{ticketId}}"),
				("2026-02-13", "late {{ticketId}}"),
			])),
			transport: Arc::new(FakeTransport::default()),
			sink: Arc::new(RecordingSink::default()),
			config: DispatchConfig {
				base_url: "https://help.example.com/tickets".into(),
				subject: "Ticket {{ticketId}} closed".into(),
				locale: DateLocale::En,
				due_days: 7,
				test_recipient: None,
			},
		}
	}

	pub fn dispatcher(&self) -> Dispatcher {
		Dispatcher::new(
			Collaborators {
				directory: self.directory.clone(),
				outcomes: self.outcomes.clone(),
				templates: self.templates.clone(),
				fallback: Arc::new(NoFallback),
				transport: self.transport.clone(),
				sink: self.sink.clone(),
			},
			self.config.clone(),
		)
		.unwrap()
	}
}

// vim: ts=4
