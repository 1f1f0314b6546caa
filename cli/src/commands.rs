//! Subcommands

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::app::{App, AppBuilder};
use crate::config::Config;
use ticketmail_core::events::DispatchEvent;
use ticketmail_core::settings::SettingValue;
use ticketmail_dispatch::{DispatchOptions, RawBatch};
use ticketmail_types::error::{ClResult, Error};
use ticketmail_types::meta_adapter::{
	Contact, OutcomeStore, RequesterDirectory, TemplateData, TemplateStore,
};

#[derive(Debug, Parser)]
#[command(name = "ticketmail", version, about = "Ticket-closed email dispatch")]
pub struct Cli {
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Send the ticket-closed email for every ticket of a batch file
	Dispatch(DispatchArgs),
	/// Show the recorded outcomes of one ticket
	Outcomes {
		ticket_id: String,
	},
	#[command(subcommand)]
	Template(TemplateCommand),
	#[command(subcommand)]
	Contact(ContactCommand),
	#[command(subcommand)]
	Setting(SettingCommand),
}

#[derive(Debug, Args)]
pub struct DispatchArgs {
	/// JSON file `{ "header": [...], "rows": [[...], ...] }`
	pub batch: PathBuf,

	/// Send every message to the test recipient instead of the requester
	#[arg(long)]
	pub test_mode: bool,

	/// Ignore outcomes recorded by earlier batches
	#[arg(long)]
	pub force_resend: bool,

	/// Test recipient for this run, overrides `email.test_recipient`
	#[arg(long, requires = "test_mode")]
	pub test_recipient: Option<String>,
}

/// Manage date-scoped templates
#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
	Add {
		#[arg(long)]
		name: String,
		/// First creation date (YYYY-MM-DD) the template is meant for
		#[arg(long)]
		valid_from: NaiveDate,
		/// HTML body
		#[arg(long)]
		file: PathBuf,
	},
	List,
	Delete {
		id: i64,
	},
	/// Show which template a creation date resolves to, and why
	Resolve {
		date: Option<String>,
	},
}

/// Manage the requester directory
#[derive(Debug, Subcommand)]
pub enum ContactCommand {
	Add {
		#[arg(long)]
		username: String,
		#[arg(long)]
		email: Option<String>,
		#[arg(long)]
		name: Option<String>,
		/// Never notify this requester
		#[arg(long)]
		excluded: bool,
	},
	Show {
		username: String,
	},
}

/// Read and change runtime settings
#[derive(Debug, Subcommand)]
pub enum SettingCommand {
	/// Store a value, given as JSON (`true`, `25`, `"text"`)
	Set { key: String, value: String },
	Get { key: String },
	/// Remove the stored value, the default applies again
	Reset { key: String },
	List,
}

pub async fn run(cli: Cli, config: Config) -> ClResult<()> {
	let app = AppBuilder::new(config).build().await?;
	let res = match cli.command {
		Command::Dispatch(args) => dispatch(&app, args).await,
		Command::Outcomes { ticket_id } => outcomes(&app, &ticket_id).await,
		Command::Template(cmd) => template(&app, cmd).await,
		Command::Contact(cmd) => contact(&app, cmd).await,
		Command::Setting(cmd) => setting(&app, cmd).await,
	};
	app.close().await;
	res
}

fn print_json(value: &impl serde::Serialize) -> ClResult<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

// Dispatch
//**********
async fn dispatch(app: &App, args: DispatchArgs) -> ClResult<()> {
	let raw = tokio::fs::read_to_string(&args.batch).await?;
	let batch: RawBatch = serde_json::from_str(&raw)?;

	let ingested = app.ingestor().await?.ingest(&batch)?;
	for row in &ingested.invalid_rows {
		eprintln!("row {}: {} {:?}", row.row_number, row.reason, row.raw_data);
	}
	match ingested.find_unknown_users(app.meta.as_ref()).await {
		Ok(unknown) if !unknown.is_empty() => {
			eprintln!("requesters without email: {}", unknown.join(", "));
		}
		Ok(_) => {}
		Err(err) => warn!("Unknown user check failed: {}", err),
	}

	let mut events = app.events.subscribe();
	let progress = tokio::spawn(async move {
		loop {
			match events.recv().await {
				Ok(DispatchEvent::BatchCompleted(_)) | Err(RecvError::Closed) => break,
				Ok(DispatchEvent::Sent { ticket_id, recipient, .. }) => {
					eprintln!("{}: sent to {}", ticket_id, recipient);
				}
				Ok(DispatchEvent::Skipped { ticket_id, reason, .. }) => {
					eprintln!("{}: skipped, {}", ticket_id, reason);
				}
				Ok(DispatchEvent::Failed { ticket_id, reason, .. }) => {
					eprintln!("{}: failed, {}", ticket_id, reason);
				}
				Err(RecvError::Lagged(n)) => eprintln!("({} progress lines dropped)", n),
			}
		}
	});

	let opts = DispatchOptions {
		test_mode: args.test_mode,
		force_resend: args.force_resend,
		custom_test_recipient: args.test_recipient,
	};
	let res = app.dispatcher().await?.dispatch(&ingested.valid_tickets, &opts).await;
	if res.is_err() {
		progress.abort();
	} else if let Err(err) = progress.await {
		warn!("Progress listener ended abnormally: {}", err);
	}
	print_json(&res?)
}

async fn outcomes(app: &App, ticket_id: &str) -> ClResult<()> {
	print_json(&app.meta.list_outcomes(ticket_id).await?)
}

// Templates
//***********
async fn template(app: &App, cmd: TemplateCommand) -> ClResult<()> {
	match cmd {
		TemplateCommand::Add { name, valid_from, file } => {
			let content = tokio::fs::read_to_string(&file).await?;
			let template =
				app.meta.create_template(&TemplateData { name, content, valid_from }).await?;
			info!("Template {} created", template.id);
			println!("{}", template.id);
		}
		TemplateCommand::List => {
			for t in app.meta.list_templates().await? {
				println!("{:>5}  {}  {}", t.id, t.valid_from, t.name);
			}
		}
		TemplateCommand::Delete { id } => app.meta.delete_template(id).await?,
		TemplateCommand::Resolve { date } => {
			let resolved = app.template_resolver().await?.resolve(date.as_deref()).await;
			print_json(&serde_json::json!({
				"templateId": resolved.template_id,
				"name": resolved.name,
				"subject": resolved.subject,
				"trace": resolved.trace,
			}))?;
		}
	}
	Ok(())
}

// Contacts
//**********
async fn contact(app: &App, cmd: ContactCommand) -> ClResult<()> {
	match cmd {
		ContactCommand::Add { username, email, name, excluded } => {
			app.meta
				.upsert_contact(&Contact {
					username,
					email,
					display_name: name,
					excluded_from_notifications: excluded,
				})
				.await
		}
		ContactCommand::Show { username } => match app.meta.find_by_username(&username).await? {
			Some(contact) => print_json(&contact),
			None => Err(Error::NotFound),
		},
	}
}

// Settings
//**********
async fn setting(app: &App, cmd: SettingCommand) -> ClResult<()> {
	match cmd {
		SettingCommand::Set { key, value } => {
			let value: SettingValue = serde_json::from_str(&value)?;
			app.settings.set(&key, value).await
		}
		SettingCommand::Get { key } => print_json(&app.settings.resolve(&key).await?),
		SettingCommand::Reset { key } => app.settings.delete(&key).await,
		SettingCommand::List => {
			for def in app.settings.registry().list() {
				let value = app.settings.resolve(&def.key).await?;
				let shown = match value {
					Some(_) if def.key.ends_with("password") => "\"***\"".to_string(),
					Some(value) => serde_json::to_string(&value)?,
					None => "-".to_string(),
				};
				println!("{} = {}", def.key, shown);
			}
			Ok(())
		}
	}
}


// vim: ts=4
