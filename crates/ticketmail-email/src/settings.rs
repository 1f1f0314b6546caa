//! Email settings registration
//!
//! Registers SMTP, sender and template settings.

use crate::prelude::*;
use ticketmail_core::settings::{SettingDefinition, SettingScope, SettingValue, SettingsRegistry};

fn email_address(v: &SettingValue) -> ClResult<()> {
	if let SettingValue::String(email) = v {
		if email.contains('@') && email.contains('.') {
			return Ok(());
		}
	}
	Err(Error::ValidationError("Invalid email address format".into()))
}

/// Register all email settings
///
/// `template_dir` comes from the bootstrap config and cannot change at runtime.
pub fn register_settings(registry: &mut SettingsRegistry, template_dir: &str) -> ClResult<()> {
	registry.register(
		SettingDefinition::builder("email.enabled")
			.description("Enable email sending (disable for dry runs)")
			.default(SettingValue::Bool(false))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.smtp.host")
			.description("SMTP server hostname (e.g., smtp.example.com)")
			.optional(true)
			.build()?, // Checked at send time
	)?;

	registry.register(
		SettingDefinition::builder("email.smtp.port")
			.description("SMTP server port (typically 25, 465, or 587)")
			.default(SettingValue::Int(587))
			.validator(|v| {
				if let SettingValue::Int(port) = v {
					if *port > 0 && *port < 65536 {
						return Ok(());
					}
				}
				Err(Error::ValidationError("Port must be between 1 and 65535".into()))
			})
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.smtp.username")
			.description("SMTP authentication username")
			.optional(true)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.smtp.password")
			.description("SMTP authentication password")
			.optional(true)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.smtp.tls_mode")
			.description(
				"TLS mode: none, starttls, or tls (StartTLS on port 587, TLS/SSL on port 465)",
			)
			.default(SettingValue::String("starttls".into()))
			.validator(|v| {
				if let SettingValue::String(mode) = v {
					if ["none", "starttls", "tls"].contains(&mode.as_str()) {
						return Ok(());
					}
				}
				Err(Error::ValidationError("TLS mode must be: none, starttls, or tls".into()))
			})
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.smtp.timeout_seconds")
			.description("SMTP connection timeout in seconds")
			.default(SettingValue::Int(30))
			.validator(|v| match v {
				SettingValue::Int(secs) if *secs > 0 => Ok(()),
				_ => Err(Error::ValidationError("Timeout must be positive".into())),
			})
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.from.address")
			.description("Email sender address (e.g., support@example.com)")
			.optional(true)
			.validator(email_address)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.from.name")
			.description("Email sender display name")
			.default(SettingValue::String("Support".into()))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.template_dir")
			.description("Directory of the filesystem fallback template")
			.default(SettingValue::String(template_dir.into()))
			.scope(SettingScope::System)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.test_recipient")
			.description("Recipient of all messages in test mode")
			.optional(true)
			.validator(email_address)
			.build()?,
	)?;

	Ok(())
}


// vim: ts=4
