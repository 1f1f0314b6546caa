//! SQLite storage for ticketmail
//!
//! One database file (`meta.db`) holds the requester directory, the template
//! store, the append-only outcome history and the runtime settings. The
//! adapter implements every storage trait of `ticketmail_types::meta_adapter`.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{self, SqlitePool};
use std::collections::HashMap;
use std::path::Path;

use ticketmail_types::meta_adapter::{
	Contact, OutcomeStore, PriorOutcome, RequesterDirectory, SettingsStore, Template, TemplateData,
	TemplateStore,
};
use ticketmail_types::outcome::DispatchOutcome;
use ticketmail_types::prelude::*;

mod contact;
mod outcome;
mod schema;
mod setting;
mod template;
mod utils;

pub const DB_FILE_NAME: &str = "meta.db";

#[derive(Debug, Clone)]
pub struct MetaAdapterSqlite {
	db: SqlitePool,
}

impl MetaAdapterSqlite {
	/// Open (or create) the database in `dir`
	pub async fn new(dir: impl AsRef<Path>) -> ClResult<Self> {
		let dir = dir.as_ref();
		tokio::fs::create_dir_all(dir).await?;

		let opts = sqlite::SqliteConnectOptions::new()
			.filename(dir.join(DB_FILE_NAME))
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| error!("DB: {:#?}", err))
			.map_err(|_| Error::DbError)?;

		schema::init_db(&db)
			.await
			.inspect_err(|err| error!("DB: {:#?}", err))
			.map_err(|_| Error::DbError)?;

		info!("Metadata database opened at {}", dir.join(DB_FILE_NAME).display());
		Ok(Self { db })
	}

	/// Create or update a contact of the requester directory
	pub async fn upsert_contact(&self, contact: &Contact) -> ClResult<()> {
		contact::upsert(&self.db, contact).await
	}

	pub async fn close(&self) {
		self.db.close().await;
	}
}

#[async_trait]
impl RequesterDirectory for MetaAdapterSqlite {
	async fn find_by_username(&self, username: &str) -> ClResult<Option<Contact>> {
		contact::read(&self.db, username).await
	}

	async fn find_by_usernames(&self, usernames: &[&str]) -> ClResult<Vec<Contact>> {
		contact::read_many(&self.db, usernames).await
	}
}

#[async_trait]
impl OutcomeStore for MetaAdapterSqlite {
	async fn find_existing_tickets(
		&self,
		ticket_ids: &[&str],
	) -> ClResult<HashMap<String, PriorOutcome>> {
		outcome::find_existing(&self.db, ticket_ids).await
	}

	async fn save_outcome(&self, outcome: &DispatchOutcome) -> ClResult<()> {
		outcome::save(&self.db, outcome).await
	}

	async fn list_outcomes(&self, ticket_id: &str) -> ClResult<Vec<DispatchOutcome>> {
		outcome::list(&self.db, ticket_id).await
	}

	async fn flush(&self) -> ClResult<()> {
		outcome::checkpoint(&self.db).await
	}
}

#[async_trait]
impl TemplateStore for MetaAdapterSqlite {
	async fn list_templates(&self) -> ClResult<Vec<Template>> {
		template::list(&self.db).await
	}

	async fn read_template(&self, id: i64) -> ClResult<Template> {
		template::read(&self.db, id).await
	}

	async fn create_template(&self, data: &TemplateData) -> ClResult<Template> {
		template::create(&self.db, data).await
	}

	async fn update_template(&self, id: i64, data: &TemplateData) -> ClResult<Template> {
		template::update(&self.db, id, data).await
	}

	async fn delete_template(&self, id: i64) -> ClResult<()> {
		template::delete(&self.db, id).await
	}

	async fn find_template_for_date(&self, date: NaiveDate) -> ClResult<Option<Template>> {
		template::find_for_date(&self.db, date).await
	}

	async fn find_latest_template(&self) -> ClResult<Option<Template>> {
		template::find_latest(&self.db).await
	}
}

#[async_trait]
impl SettingsStore for MetaAdapterSqlite {
	async fn read_setting(&self, name: &str) -> ClResult<Option<serde_json::Value>> {
		setting::read(&self.db, name).await
	}

	async fn update_setting(&self, name: &str, value: Option<serde_json::Value>) -> ClResult<()> {
		setting::update(&self.db, name, value).await
	}

	async fn list_settings(
		&self,
		prefix: Option<&str>,
	) -> ClResult<HashMap<String, serde_json::Value>> {
		setting::list(&self.db, prefix).await
	}
}

// vim: ts=4
