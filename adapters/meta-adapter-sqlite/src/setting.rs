//! Settings key-value store
//!
//! Values are stored as JSON text.

use std::collections::HashMap;

use sqlx::{Row, SqlitePool};

use crate::utils::db_err;
use ticketmail_types::prelude::*;

/// List all settings, or those whose name starts with `prefix`
pub(crate) async fn list(
	db: &SqlitePool,
	prefix: Option<&str>,
) -> ClResult<HashMap<String, serde_json::Value>> {
	let rows = if let Some(prefix) = prefix {
		sqlx::query("SELECT name, value FROM settings WHERE substr(name, 1, length(?1)) = ?1")
			.bind(prefix)
			.fetch_all(db)
			.await
			.map_err(db_err)?
	} else {
		sqlx::query("SELECT name, value FROM settings").fetch_all(db).await.map_err(db_err)?
	};

	let mut settings = HashMap::new();
	for row in rows {
		let name: String = row.try_get("name").map_err(db_err)?;
		let value: Option<String> = row.try_get("value").map_err(db_err)?;
		settings.insert(
			name,
			value
				.and_then(|v| serde_json::from_str(&v).ok())
				.unwrap_or(serde_json::Value::Null),
		);
	}

	Ok(settings)
}

/// Read a single setting by name
pub(crate) async fn read(db: &SqlitePool, name: &str) -> ClResult<Option<serde_json::Value>> {
	let row = sqlx::query("SELECT value FROM settings WHERE name = ?")
		.bind(name)
		.fetch_optional(db)
		.await
		.map_err(db_err)?;

	let Some(row) = row else {
		return Ok(None);
	};
	let value: Option<String> = row.try_get("value").map_err(db_err)?;
	match value {
		Some(v) => Ok(Some(serde_json::from_str(&v)?)),
		None => Ok(None),
	}
}

/// Update or create a setting; `None` deletes it
pub(crate) async fn update(
	db: &SqlitePool,
	name: &str,
	value: Option<serde_json::Value>,
) -> ClResult<()> {
	if let Some(val) = value {
		sqlx::query("INSERT OR REPLACE INTO settings (name, value) VALUES (?, ?)")
			.bind(name)
			.bind(val.to_string())
			.execute(db)
			.await
			.map_err(db_err)?;
	} else {
		sqlx::query("DELETE FROM settings WHERE name = ?")
			.bind(name)
			.execute(db)
			.await
			.map_err(db_err)?;
	}

	Ok(())
}

// vim: ts=4
