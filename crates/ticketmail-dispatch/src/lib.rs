//! Ticket email dispatch pipeline
//!
//! - Ingestion: raw table rows to validated tickets plus row diagnostics
//! - Classification: duplicates, prior outcomes, excluded and unknown requesters
//! - Dispatch: template resolution, composition and transport per ticket
//! - Recording: one stored outcome per ticket, error records on failed saves,
//!   notifications and a batch summary

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod classify;
pub mod ingest;
pub mod pipeline;
pub mod settings;
pub mod writer;

mod prelude;

pub use ingest::{FieldMapping, IngestResult, Ingestor, InvalidRow, RawBatch};
pub use pipeline::{BatchReport, Collaborators, DispatchConfig, DispatchOptions, Dispatcher};
pub use settings::register_settings;

// vim: ts=4
