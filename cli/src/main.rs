//! Ticketmail command line
//!
//! Dispatches ticket batches and manages the templates, contacts and settings
//! the pipeline works with. Bootstrap configuration comes from the
//! environment (`TICKETMAIL_DB_DIR`, `TICKETMAIL_TEMPLATE_DIR`,
//! `TICKETMAIL_SETTINGS_CACHE`), logging is controlled by `RUST_LOG`.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

use clap::Parser;
use std::process::ExitCode;
use tracing::error;

mod app;
mod commands;
mod config;

use commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
	app::init_tracing();
	let cli = Cli::parse();

	let config = match config::Config::from_env() {
		Ok(config) => config,
		Err(err) => {
			eprintln!("error: {}", err);
			return ExitCode::FAILURE;
		}
	};

	match commands::run(cli, config).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!("Command failed: {}", err);
			eprintln!("error: {}", err);
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
