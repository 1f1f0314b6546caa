//! SMTP email sender using lettre
//!
//! `MailTransport` is the seam the dispatch pipeline sends through. The SMTP
//! implementation reads its connection settings on every send, so changes made
//! with `setting set` apply to the next batch without a restart.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;

use crate::prelude::*;
use ticketmail_core::settings::service::SettingsService;

/// Email message to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
	pub to: String,
	pub subject: String,
	pub text_body: String,
	pub html_body: Option<String>,
}

/// Delivers one message, failing with a transport error message
#[async_trait]
pub trait MailTransport: Send + Sync {
	async fn send(&self, message: &EmailMessage) -> ClResult<()>;
}

/// SMTP settings as read for one send
#[derive(Debug, Clone)]
struct SmtpConfig {
	host: String,
	port: u16,
	username: Option<String>,
	password: Option<String>,
	tls_mode: String,
	timeout_seconds: u64,
	from: Mailbox,
}

/// SMTP email sender
pub struct SmtpSender {
	settings_service: Arc<SettingsService>,
}

impl SmtpSender {
	pub fn new(settings_service: Arc<SettingsService>) -> Self {
		Self { settings_service }
	}

	async fn load_config(&self) -> ClResult<SmtpConfig> {
		let settings = &self.settings_service;
		let host = settings
			.get_string_opt("email.smtp.host")
			.await?
			.ok_or_else(|| Error::ConfigError("email.smtp.host is not configured".into()))?;
		let port = u16::try_from(settings.get_int("email.smtp.port").await?)
			.map_err(|_| Error::ConfigError("email.smtp.port is out of range".into()))?;
		let timeout_seconds = u64::try_from(settings.get_int("email.smtp.timeout_seconds").await?)
			.map_err(|_| Error::ConfigError("email.smtp.timeout_seconds is negative".into()))?;
		let from_address = settings
			.get_string_opt("email.from.address")
			.await?
			.ok_or_else(|| Error::ConfigError("email.from.address is not configured".into()))?;
		let from_name = settings.get_string("email.from.name").await?;

		let from = format!("{} <{}>", from_name, from_address)
			.parse::<Mailbox>()
			.map_err(|_| Error::ConfigError("Invalid from email format".into()))?;

		Ok(SmtpConfig {
			host,
			port,
			username: settings.get_string_opt("email.smtp.username").await?,
			password: settings.get_string_opt("email.smtp.password").await?,
			tls_mode: settings.get_string("email.smtp.tls_mode").await?,
			timeout_seconds,
			from,
		})
	}

	fn build_transport(config: &SmtpConfig) -> ClResult<AsyncSmtpTransport<Tokio1Executor>> {
		let tls_params = || {
			TlsParameters::builder(config.host.clone())
				.build()
				.map_err(|e| Error::ConfigError(format!("TLS configuration error: {}", e)))
		};
		let tls = match config.tls_mode.as_str() {
			"tls" => Tls::Wrapper(tls_params()?),
			"starttls" => Tls::Opportunistic(tls_params()?),
			"none" => Tls::None,
			mode => {
				return Err(Error::ConfigError(format!(
					"Invalid TLS mode: {}. Must be 'none', 'starttls', or 'tls'",
					mode
				)));
			}
		};
		debug!("SMTP transport {}:{} with TLS mode {}", config.host, config.port, config.tls_mode);

		let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
			.port(config.port)
			.timeout(Some(Duration::from_secs(config.timeout_seconds)))
			.tls(tls);
		if let (Some(username), Some(password)) = (&config.username, &config.password) {
			builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
		}
		Ok(builder.build())
	}

	fn build_message(from: Mailbox, message: &EmailMessage) -> ClResult<Message> {
		let to = message
			.to
			.parse::<Mailbox>()
			.map_err(|_| Error::ValidationError("Invalid recipient email format".into()))?;
		let builder = Message::builder().from(from).to(to).subject(&message.subject);

		let email = if let Some(html_body) = &message.html_body {
			builder.multipart(
				MultiPart::alternative()
					.singlepart(SinglePart::plain(message.text_body.clone()))
					.singlepart(SinglePart::html(html_body.clone())),
			)
		} else {
			builder.singlepart(SinglePart::plain(message.text_body.clone()))
		};
		email.map_err(|e| Error::ValidationError(format!("Failed to build email: {}", e)))
	}
}

#[async_trait]
impl MailTransport for SmtpSender {
	async fn send(&self, message: &EmailMessage) -> ClResult<()> {
		if !self.settings_service.get_bool("email.enabled").await? {
			info!("Email sending disabled, not sending to {}", message.to);
			return Err(Error::ServiceUnavailable("email sending is disabled".into()));
		}

		let config = self.load_config().await?;
		let email = Self::build_message(config.from.clone(), message)?;
		let mailer = Self::build_transport(&config)?;

		match mailer.send(email).await {
			Ok(response) => {
				info!("Email sent to {} (response: {:?})", message.to, response.code());
				Ok(())
			}
			Err(e) => {
				warn!("Failed to send email to {}: {}", message.to, e);
				Err(Error::ServiceUnavailable(format!("SMTP send failed: {}", e)))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn from() -> Mailbox {
		"Support <support@example.com>".parse().unwrap()
	}

	#[test]
	fn test_build_multipart_message() {
		let message = EmailMessage {
			to: "user@example.com".into(),
			subject: "Ticket T-1 closed".into(),
			text_body: "Plain".into(),
			html_body: Some("<p>Html</p>".into()),
		};
		let email = SmtpSender::build_message(from(), &message).unwrap();
		let raw = String::from_utf8(email.formatted()).unwrap();
		assert!(raw.contains("To: user@example.com"));
		assert!(raw.contains("Subject: Ticket T-1 closed"));
		assert!(raw.contains("multipart/alternative"));
	}

	#[test]
	fn test_invalid_recipient_rejected() {
		let message = EmailMessage {
			to: "not-an-address".into(),
			subject: "s".into(),
			text_body: "b".into(),
			html_body: None,
		};
		assert!(matches!(
			SmtpSender::build_message(from(), &message),
			Err(Error::ValidationError(_))
		));
	}

	#[test]
	fn test_invalid_tls_mode_rejected() {
		let config = SmtpConfig {
			host: "localhost".into(),
			port: 25,
			username: None,
			password: None,
			tls_mode: "ssl3".into(),
			timeout_seconds: 5,
			from: from(),
		};
		assert!(matches!(SmtpSender::build_transport(&config), Err(Error::ConfigError(_))));

		let config = SmtpConfig { tls_mode: "none".into(), ..config };
		assert!(SmtpSender::build_transport(&config).is_ok());
	}
}

// vim: ts=4
