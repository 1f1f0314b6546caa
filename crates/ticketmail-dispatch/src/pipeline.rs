//! The dispatch pipeline
//!
//! Tickets are processed strictly one after another. Before the pass, the
//! prior outcomes and the contacts of the whole batch are fetched once. Every
//! ticket yields exactly one outcome, in input order.

use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::classify::{BatchState, check_requester};
use crate::prelude::*;
use crate::writer::RecordWriter;
use ticketmail_core::events::{BatchSummary, NotificationSink};
use ticketmail_core::settings::service::SettingsService;
use ticketmail_email::compose::{ComposeRequest, Composer, DateLocale};
use ticketmail_email::sender::{EmailMessage, MailTransport};
use ticketmail_email::template::{FallbackTemplateProvider, TemplateResolver};
use ticketmail_types::meta_adapter::{
	Contact, OutcomeStore, PriorOutcome, RequesterDirectory, TemplateStore,
};
use ticketmail_types::outcome::{DispatchOutcome, DispatchStatus};
use ticketmail_types::ticket::TicketData;
use ticketmail_types::utils::non_blank;

pub const NO_TEST_RECIPIENT: &str = "no test recipient configured";

/// Caller options of one batch
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
	pub test_mode: bool,
	pub force_resend: bool,
	/// Test mode only: overrides the configured test recipient
	pub custom_test_recipient: Option<String>,
}

/// Settings-derived configuration of the pipeline
#[derive(Debug, Clone)]
pub struct DispatchConfig {
	pub base_url: String,
	pub subject: String,
	pub locale: DateLocale,
	pub due_days: u64,
	pub test_recipient: Option<String>,
}

impl DispatchConfig {
	pub async fn load(settings: &SettingsService) -> ClResult<Self> {
		let due_days = u64::try_from(settings.get_int("dispatch.due_days").await?)
			.map_err(|_| Error::ConfigError("dispatch.due_days must not be negative".into()))?;
		Ok(Self {
			base_url: settings.get_string("dispatch.base_url").await?,
			subject: settings.get_string("dispatch.subject").await?,
			locale: settings.get_string("dispatch.locale").await?.parse()?,
			due_days,
			test_recipient: settings.get_string_opt("email.test_recipient").await?,
		})
	}
}

/// Storage, template, transport and notification collaborators
#[derive(Clone)]
pub struct Collaborators {
	pub directory: Arc<dyn RequesterDirectory>,
	pub outcomes: Arc<dyn OutcomeStore>,
	pub templates: Arc<dyn TemplateStore>,
	pub fallback: Arc<dyn FallbackTemplateProvider>,
	pub transport: Arc<dyn MailTransport>,
	pub sink: Arc<dyn NotificationSink>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
	pub outcomes: Vec<DispatchOutcome>,
	pub summary: BatchSummary,
}

pub struct Dispatcher {
	collab: Collaborators,
	config: DispatchConfig,
	composer: Composer,
}

impl Dispatcher {
	pub fn new(collab: Collaborators, config: DispatchConfig) -> ClResult<Self> {
		let composer = Composer::new(&config.base_url, config.locale, config.due_days)?;
		Ok(Self { collab, config, composer })
	}

	/// Run one batch
	///
	/// Fails only when the prior outcomes cannot be looked up; nothing is sent
	/// or recorded then. Every other failure becomes the outcome of its ticket.
	pub async fn dispatch(
		&self,
		tickets: &[TicketData],
		opts: &DispatchOptions,
	) -> ClResult<BatchReport> {
		info!(
			"Dispatching {} tickets (test mode: {}, force resend: {})",
			tickets.len(),
			opts.test_mode,
			opts.force_resend
		);

		let prior = self.load_prior(tickets, opts.force_resend).await?;
		let contacts = self.load_contacts(tickets).await;
		let resolver =
			TemplateResolver::load(self.collab.templates.clone(), self.collab.fallback.clone())
				.await;
		let test_recipient = opts
			.custom_test_recipient
			.as_deref()
			.and_then(non_blank)
			.or_else(|| self.config.test_recipient.as_deref().and_then(non_blank))
			.map(str::to_string);

		let mut run = BatchRun {
			dispatcher: self,
			state: BatchState::new(prior, opts.force_resend),
			contacts,
			resolver,
			today: Local::now().date_naive(),
			test_mode: opts.test_mode,
			test_recipient,
		};
		let mut writer =
			RecordWriter::new(self.collab.outcomes.clone(), self.collab.sink.clone(), opts.test_mode);

		let mut outcomes = Vec::with_capacity(tickets.len());
		for ticket in tickets {
			let outcome = run.process(ticket).await;
			outcomes.push(writer.record(outcome).await);
		}

		let summary = writer.finish().await;
		Ok(BatchReport { outcomes, summary })
	}

	async fn load_prior(
		&self,
		tickets: &[TicketData],
		force_resend: bool,
	) -> ClResult<HashMap<String, PriorOutcome>> {
		if force_resend {
			return Ok(HashMap::new());
		}
		let mut ids: Vec<&str> = tickets.iter().map(TicketData::ticket_id).collect();
		ids.sort_unstable();
		ids.dedup();
		self.collab.outcomes.find_existing_tickets(&ids).await.map_err(|err| {
			error!("Prior outcome lookup failed, batch not processed: {}", err);
			Error::ServiceUnavailable(format!("outcome store unavailable: {}", err))
		})
	}

	/// Bulk contact lookup; `None` when it failed and lookups go per ticket
	async fn load_contacts(&self, tickets: &[TicketData]) -> Option<HashMap<String, Contact>> {
		let mut usernames: Vec<&str> = tickets.iter().map(TicketData::username).collect();
		usernames.sort_unstable();
		usernames.dedup();
		match self.collab.directory.find_by_usernames(&usernames).await {
			Ok(found) => Some(found.into_iter().map(|c| (c.username.clone(), c)).collect()),
			Err(err) => {
				warn!("Bulk contact lookup failed, looking up per ticket: {}", err);
				None
			}
		}
	}
}

/// State of one running batch
struct BatchRun<'a> {
	dispatcher: &'a Dispatcher,
	state: BatchState,
	contacts: Option<HashMap<String, Contact>>,
	resolver: TemplateResolver,
	today: NaiveDate,
	test_mode: bool,
	test_recipient: Option<String>,
}

impl BatchRun<'_> {
	async fn contact(&self, username: &str) -> Result<Option<Contact>, DispatchStatus> {
		if let Some(contacts) = &self.contacts {
			return Ok(contacts.get(username).cloned());
		}
		self.dispatcher.collab.directory.find_by_username(username).await.map_err(|err| {
			warn!("Contact lookup for {} failed: {}", username, err);
			DispatchStatus::Error(format!("requester lookup failed - {}", err))
		})
	}

	async fn process(&mut self, ticket: &TicketData) -> DispatchOutcome {
		let d = self.dispatcher;

		if let Some(status) = self.state.check_batch(ticket) {
			return self.outcome(ticket, None, &d.config.subject, status);
		}

		let contact = match self.contact(ticket.username()).await {
			Ok(contact) => contact,
			Err(status) => return self.outcome(ticket, None, &d.config.subject, status),
		};
		let email = match check_requester(contact.as_ref()) {
			Ok(email) => email.to_string(),
			Err(status) => return self.outcome(ticket, contact.as_ref(), &d.config.subject, status),
		};

		let recipient = if self.test_mode {
			match &self.test_recipient {
				Some(addr) => addr.clone(),
				None => {
					let status = DispatchStatus::Error(NO_TEST_RECIPIENT.into());
					return self.outcome(ticket, contact.as_ref(), &d.config.subject, status);
				}
			}
		} else {
			email
		};

		let template = self.resolver.resolve(ticket.created()).await;
		debug!(
			"Ticket {}: template '{}' via {} (created {:?}, parsed {:?})",
			ticket.ticket_id(),
			template.name,
			template.trace.method,
			template.trace.input,
			template.trace.parsed
		);
		let subject = template.subject.as_deref().unwrap_or(&d.config.subject);

		let message = d.composer.compose(
			&ComposeRequest {
				template: &template.content,
				subject,
				ticket,
				contact: contact.as_ref(),
				test_mode: self.test_mode,
			},
			self.today,
		);

		let status = match d
			.collab
			.transport
			.send(&EmailMessage {
				to: recipient.clone(),
				subject: message.subject.clone(),
				text_body: message.text_body,
				html_body: Some(message.html_body),
			})
			.await
		{
			Ok(()) => {
				debug!("Ticket {}: sent to {}", ticket.ticket_id(), recipient);
				DispatchStatus::Sent
			}
			Err(err) => {
				warn!("Ticket {}: sending to {} failed: {}", ticket.ticket_id(), recipient, err);
				DispatchStatus::Error(err.to_string())
			}
		};

		DispatchOutcome::new(
			ticket,
			contact.as_ref().and_then(Contact::email).map(str::to_string),
			message.subject,
			status,
			self.test_mode,
		)
	}

	fn outcome(
		&self,
		ticket: &TicketData,
		contact: Option<&Contact>,
		subject: &str,
		status: DispatchStatus,
	) -> DispatchOutcome {
		let subject = self.dispatcher.composer.subject(
			&ComposeRequest { template: "", subject, ticket, contact, test_mode: self.test_mode },
			self.today,
		);
		DispatchOutcome::new(
			ticket,
			contact.and_then(Contact::email).map(str::to_string),
			subject,
			status,
			self.test_mode,
		)
	}
}

// vim: ts=4
