//! Ticket-closed email content and delivery
//!
//! This crate provides:
//! - Tolerant parsing of ticket creation dates
//! - Date-scoped template resolution with an ordered fallback chain
//! - Placeholder substitution, test banner and plain-text alternative
//! - SMTP email sending with lettre
//! - Registration of the email settings

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod compose;
pub mod date;
pub mod sender;
pub mod settings;
pub mod template;

pub use compose::{ComposeRequest, ComposedMessage, Composer, DateLocale};
pub use date::parse_ticket_date;
pub use sender::{EmailMessage, MailTransport, SmtpSender};
pub use settings::register_settings;
pub use template::{
	FallbackTemplateProvider, FsTemplateProvider, ResolutionMethod, ResolvedTemplate,
	TemplateResolver,
};

mod prelude;

// vim: ts=4
