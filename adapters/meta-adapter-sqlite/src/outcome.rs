//! Dispatch outcome history
//!
//! Every write appends a row; nothing is updated or deleted. Each save runs in
//! its own transaction so that a failed record never affects another one.

use std::collections::HashMap;

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::utils::{MAX_IN_PARAMS, collect_res, db_err, decode_err, push_in};
use ticketmail_types::meta_adapter::PriorOutcome;
use ticketmail_types::outcome::{DispatchOutcome, DispatchStatus};
use ticketmail_types::prelude::*;

fn map_status(row: &SqliteRow) -> Result<DispatchStatus, sqlx::Error> {
	let status: String = row.try_get("status")?;
	let detail: Option<String> = row.try_get("detail")?;
	DispatchStatus::from_parts(&status, detail.as_deref()).map_err(decode_err)
}

fn map_outcome(row: SqliteRow) -> Result<DispatchOutcome, sqlx::Error> {
	Ok(DispatchOutcome {
		status: map_status(&row)?,
		ticket_id: row.try_get("ticket_id")?,
		username: row.try_get("username")?,
		resolved_email: row.try_get("resolved_email")?,
		subject: row.try_get("subject")?,
		timestamp: Timestamp(row.try_get("created_at")?),
		test_mode: row.try_get("test_mode")?,
		ticket_name: row.try_get("ticket_name")?,
		ticket_created: row.try_get("ticket_created")?,
	})
}

/// Earliest outcome of every given ticket that has one
pub(crate) async fn find_existing(
	db: &SqlitePool,
	ticket_ids: &[&str],
) -> ClResult<HashMap<String, PriorOutcome>> {
	let mut found = HashMap::new();
	for chunk in ticket_ids.chunks(MAX_IN_PARAMS) {
		let query = sqlx::QueryBuilder::new(
			"SELECT ticket_id, status, detail, created_at FROM dispatch_outcomes WHERE ticket_id IN ",
		);
		let mut query = push_in(query, chunk);
		query.push(" ORDER BY created_at, outcome_id");
		let rows = query.build().fetch_all(db).await.map_err(db_err)?;

		let priors = collect_res(rows.into_iter().map(
			|row| -> Result<(String, PriorOutcome), sqlx::Error> {
				let ticket_id = row.try_get("ticket_id")?;
				let timestamp = Timestamp(row.try_get("created_at")?);
				Ok((ticket_id, PriorOutcome { timestamp, status: map_status(&row)? }))
			},
		))?;
		for (ticket_id, prior) in priors {
			found.entry(ticket_id).or_insert(prior);
		}
	}
	Ok(found)
}

pub(crate) async fn save(db: &SqlitePool, outcome: &DispatchOutcome) -> ClResult<()> {
	let mut tx = db.begin().await.map_err(db_err)?;

	sqlx::query(
		"INSERT INTO dispatch_outcomes (ticket_id, username, resolved_email, subject, status,
			detail, test_mode, ticket_name, ticket_created, created_at)
		VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
	)
	.bind(&outcome.ticket_id)
	.bind(&outcome.username)
	.bind(&outcome.resolved_email)
	.bind(&outcome.subject)
	.bind(outcome.status.tag())
	.bind(outcome.status.detail())
	.bind(outcome.test_mode)
	.bind(&outcome.ticket_name)
	.bind(&outcome.ticket_created)
	.bind(outcome.timestamp.0)
	.execute(&mut *tx)
	.await
	.map_err(db_err)?;

	tx.commit().await.map_err(db_err)?;
	Ok(())
}

pub(crate) async fn list(db: &SqlitePool, ticket_id: &str) -> ClResult<Vec<DispatchOutcome>> {
	let rows = sqlx::query(
		"SELECT ticket_id, username, resolved_email, subject, status, detail, test_mode,
			ticket_name, ticket_created, created_at
		FROM dispatch_outcomes WHERE ticket_id = ? ORDER BY created_at, outcome_id",
	)
	.bind(ticket_id)
	.fetch_all(db)
	.await
	.map_err(db_err)?;
	collect_res(rows.into_iter().map(map_outcome))
}

/// Move WAL content into the main database file
pub(crate) async fn checkpoint(db: &SqlitePool) -> ClResult<()> {
	sqlx::query("PRAGMA wal_checkpoint(PASSIVE)").execute(db).await.map_err(db_err)?;
	Ok(())
}

// vim: ts=4
