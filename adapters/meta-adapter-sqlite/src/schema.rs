//! Database schema initialization
//!
//! Creates tables and indexes if they do not exist yet.

use sqlx::SqlitePool;

/// Initialize the database schema with all required tables and indexes
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS settings (
		name text NOT NULL,
		value text,
		PRIMARY KEY(name)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Requester directory
	//*********************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS contacts (
		username text NOT NULL,
		email text,
		display_name text,
		excluded boolean NOT NULL DEFAULT 0,
		created_at datetime DEFAULT (unixepoch()),
		updated_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(username)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Templates
	//***********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS templates (
		template_id integer NOT NULL,
		name text NOT NULL,
		content text NOT NULL,
		valid_from text NOT NULL,
		created_at datetime DEFAULT (unixepoch()),
		updated_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(template_id AUTOINCREMENT)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_templates_valid_from ON templates(valid_from, template_id)",
	)
	.execute(&mut *tx)
	.await?;

	// Dispatch outcomes (append-only)
	//*********************************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS dispatch_outcomes (
		outcome_id integer NOT NULL,
		ticket_id text NOT NULL,
		username text NOT NULL,
		resolved_email text,
		subject text NOT NULL,
		status text NOT NULL,
		detail text,
		test_mode boolean NOT NULL DEFAULT 0,
		ticket_name text,
		ticket_created text,
		created_at datetime NOT NULL,
		PRIMARY KEY(outcome_id AUTOINCREMENT)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_dispatch_outcomes_ticket ON dispatch_outcomes(ticket_id, created_at)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(())
}

// vim: ts=4
