//! Requester directory

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::utils::{MAX_IN_PARAMS, collect_res, db_err, map_opt, push_in};
use ticketmail_types::meta_adapter::Contact;
use ticketmail_types::prelude::*;
use ticketmail_types::utils::non_blank;

fn map_contact(row: SqliteRow) -> Result<Contact, sqlx::Error> {
	Ok(Contact {
		username: row.try_get("username")?,
		email: row.try_get("email")?,
		display_name: row.try_get("display_name")?,
		excluded_from_notifications: row.try_get("excluded")?,
	})
}

pub(crate) async fn read(db: &SqlitePool, username: &str) -> ClResult<Option<Contact>> {
	let res = sqlx::query(
		"SELECT username, email, display_name, excluded FROM contacts WHERE username = ?",
	)
	.bind(username)
	.fetch_optional(db)
	.await;
	map_opt(res, map_contact)
}

pub(crate) async fn read_many(db: &SqlitePool, usernames: &[&str]) -> ClResult<Vec<Contact>> {
	let mut contacts = Vec::with_capacity(usernames.len());
	for chunk in usernames.chunks(MAX_IN_PARAMS) {
		let query = sqlx::QueryBuilder::new(
			"SELECT username, email, display_name, excluded FROM contacts WHERE username IN ",
		);
		let mut query = push_in(query, chunk);
		let rows = query.build().fetch_all(db).await.map_err(db_err)?;
		contacts.extend(collect_res(rows.into_iter().map(map_contact))?);
	}
	Ok(contacts)
}

/// Create or replace a contact, keeping its creation time
pub(crate) async fn upsert(db: &SqlitePool, contact: &Contact) -> ClResult<()> {
	let username = non_blank(&contact.username)
		.ok_or_else(|| Error::ValidationError("missing username".into()))?;
	let email = contact.email.as_deref().and_then(non_blank);
	if let Some(email) = email {
		if !email.contains('@') {
			return Err(Error::ValidationError(format!("invalid email address '{}'", email)));
		}
	}

	sqlx::query(
		"INSERT INTO contacts (username, email, display_name, excluded) VALUES (?1, ?2, ?3, ?4)
		ON CONFLICT(username) DO UPDATE SET email=?2, display_name=?3, excluded=?4, updated_at=unixepoch()",
	)
	.bind(username)
	.bind(email)
	.bind(contact.display_name.as_deref().and_then(non_blank))
	.bind(contact.excluded_from_notifications)
	.execute(db)
	.await
	.map_err(db_err)?;

	debug!("Contact '{}' saved", username);
	Ok(())
}

// vim: ts=4
