//! Core infrastructure for ticketmail.
//!
//! Shared by the email and dispatch crates: the settings subsystem and the
//! event bus that carries dispatch notifications to listeners.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod events;
pub mod prelude;
pub mod settings;

pub use events::{BatchSummary, DispatchEvent, EventBus, NotificationSink};
pub use settings::service::SettingsService;

// vim: ts=4
