//! Shared types, adapter traits, and core utilities for ticketmail.
//!
//! This crate contains the foundational types that are shared between the
//! dispatch pipeline, the email crate, and the storage adapters. Keeping them
//! in a separate crate lets adapters compile without pulling in the pipeline.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod error;
pub mod meta_adapter;
pub mod outcome;
pub mod prelude;
pub mod ticket;
pub mod types;
pub mod utils;

// vim: ts=4
