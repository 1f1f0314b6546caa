//! Dispatch and ingestion settings registration

use crate::prelude::*;
use ticketmail_core::settings::{SettingDefinition, SettingValue, SettingsRegistry};

pub const DEFAULT_SUBJECT: &str = "Ihr Ticket {{ticketId}} wurde geschlossen: {{ticketName}}";

fn non_empty(v: &SettingValue) -> ClResult<()> {
	match v {
		SettingValue::String(s) if !s.trim().is_empty() => Ok(()),
		_ => Err(Error::ValidationError("Value must be a non-empty string".into())),
	}
}

/// Register all dispatch settings
pub fn register_settings(registry: &mut SettingsRegistry) -> ClResult<()> {
	registry.register(
		SettingDefinition::builder("dispatch.base_url")
			.description("Base URL of ticket links; the ticket id is appended")
			.default(SettingValue::String("http://localhost/tickets".into()))
			.validator(|v| match v {
				SettingValue::String(url)
					if url.starts_with("http://") || url.starts_with("https://") =>
				{
					Ok(())
				}
				_ => Err(Error::ValidationError("Base URL must start with http:// or https://".into())),
			})
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("dispatch.subject")
			.description("Subject template; the same placeholders as the body are available")
			.default(SettingValue::String(DEFAULT_SUBJECT.into()))
			.validator(non_empty)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("dispatch.locale")
			.description("Language of due dates, banners and filesystem templates: de or en")
			.default(SettingValue::String("de".into()))
			.validator(|v| match v {
				SettingValue::String(locale) if ["de", "en"].contains(&locale.as_str()) => Ok(()),
				_ => Err(Error::ValidationError("Locale must be: de or en".into())),
			})
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("dispatch.due_days")
			.description("Days from today until the feedback due date")
			.default(SettingValue::Int(7))
			.validator(|v| match v {
				SettingValue::Int(days) if (0..=365).contains(days) => Ok(()),
				_ => Err(Error::ValidationError("Due days must be between 0 and 365".into())),
			})
			.build()?,
	)?;

	// Field mapping of the ingested table
	for (key, column) in [
		("ingest.field.ticket_id", "ticketId"),
		("ingest.field.username", "username"),
		("ingest.field.ticket_name", "ticketName"),
		("ingest.field.created", "created"),
	] {
		registry.register(
			SettingDefinition::builder(key)
				.description(format!("Header of the column holding '{}'", column))
				.default(SettingValue::String(column.into()))
				.validator(non_empty)
				.build()?,
		)?;
	}

	Ok(())
}

// vim: ts=4
