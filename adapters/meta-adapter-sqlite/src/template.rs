//! Date-scoped message templates
//!
//! `valid_from` is stored as ISO text, so text order is date order. Ties on
//! `valid_from` go to the highest id, the most recently created template.

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::utils::{collect_res, db_err, decode_err, map_opt, map_res};
use ticketmail_types::meta_adapter::{Template, TemplateData};
use ticketmail_types::prelude::*;
use ticketmail_types::utils::non_blank;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT: &str =
	"SELECT template_id, name, content, valid_from, created_at, updated_at FROM templates";

fn map_template(row: SqliteRow) -> Result<Template, sqlx::Error> {
	let valid_from: String = row.try_get("valid_from")?;
	Ok(Template {
		id: row.try_get("template_id")?,
		name: row.try_get("name")?,
		content: row.try_get("content")?,
		valid_from: NaiveDate::parse_from_str(&valid_from, DATE_FORMAT).map_err(decode_err)?,
		created_at: Timestamp(row.try_get("created_at")?),
		updated_at: Timestamp(row.try_get("updated_at")?),
	})
}

fn validate(data: &TemplateData) -> ClResult<()> {
	if non_blank(&data.name).is_none() {
		return Err(Error::ValidationError("template name must not be empty".into()));
	}
	if non_blank(&data.content).is_none() {
		return Err(Error::ValidationError("template content must not be empty".into()));
	}
	Ok(())
}

pub(crate) async fn list(db: &SqlitePool) -> ClResult<Vec<Template>> {
	let rows = sqlx::query(&format!("{} ORDER BY valid_from, template_id", SELECT))
		.fetch_all(db)
		.await
		.map_err(db_err)?;
	collect_res(rows.into_iter().map(map_template))
}

pub(crate) async fn read(db: &SqlitePool, id: i64) -> ClResult<Template> {
	let res = sqlx::query(&format!("{} WHERE template_id = ?", SELECT)).bind(id).fetch_one(db).await;
	map_res(res, map_template)
}

pub(crate) async fn create(db: &SqlitePool, data: &TemplateData) -> ClResult<Template> {
	validate(data)?;
	let res = sqlx::query(
		"INSERT INTO templates (name, content, valid_from) VALUES (?, ?, ?) RETURNING template_id",
	)
	.bind(data.name.trim())
	.bind(&data.content)
	.bind(data.valid_from.format(DATE_FORMAT).to_string())
	.fetch_one(db)
	.await;
	let id: i64 = map_res(res, |row| row.try_get("template_id"))?;

	info!("Template {} '{}' created, valid from {}", id, data.name.trim(), data.valid_from);
	read(db, id).await
}

pub(crate) async fn update(db: &SqlitePool, id: i64, data: &TemplateData) -> ClResult<Template> {
	validate(data)?;
	let res = sqlx::query(
		"UPDATE templates SET name = ?, content = ?, valid_from = ?, updated_at = unixepoch()
		WHERE template_id = ?",
	)
	.bind(data.name.trim())
	.bind(&data.content)
	.bind(data.valid_from.format(DATE_FORMAT).to_string())
	.bind(id)
	.execute(db)
	.await
	.map_err(db_err)?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	read(db, id).await
}

pub(crate) async fn delete(db: &SqlitePool, id: i64) -> ClResult<()> {
	let res = sqlx::query("DELETE FROM templates WHERE template_id = ?")
		.bind(id)
		.execute(db)
		.await
		.map_err(db_err)?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

/// Template with the smallest `valid_from` on or after `date`
pub(crate) async fn find_for_date(db: &SqlitePool, date: NaiveDate) -> ClResult<Option<Template>> {
	let res = sqlx::query(&format!(
		"{} WHERE valid_from >= ? ORDER BY valid_from ASC, template_id DESC LIMIT 1",
		SELECT
	))
	.bind(date.format(DATE_FORMAT).to_string())
	.fetch_optional(db)
	.await;
	map_opt(res, map_template)
}

pub(crate) async fn find_latest(db: &SqlitePool) -> ClResult<Option<Template>> {
	let res = sqlx::query(&format!("{} ORDER BY valid_from DESC, template_id DESC LIMIT 1", SELECT))
		.fetch_optional(db)
		.await;
	map_opt(res, map_template)
}

// vim: ts=4
