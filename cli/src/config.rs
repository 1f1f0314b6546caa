//! Bootstrap configuration, read once from the environment at start-up

use std::env;
use std::path::PathBuf;

use ticketmail_types::error::{ClResult, Error};

pub const DEFAULT_DB_DIR: &str = "./data";
pub const DEFAULT_TEMPLATE_DIR: &str = "./templates/email";
pub const DEFAULT_SETTINGS_CACHE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	pub db_dir: PathBuf,
	pub template_dir: PathBuf,
	pub settings_cache: usize,
}

impl Config {
	pub fn from_env() -> ClResult<Self> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClResult<Self> {
		let settings_cache = match lookup("TICKETMAIL_SETTINGS_CACHE") {
			Some(value) => value.trim().parse().map_err(|_| {
				Error::ConfigError(format!("TICKETMAIL_SETTINGS_CACHE: invalid size '{}'", value))
			})?,
			None => DEFAULT_SETTINGS_CACHE,
		};
		Ok(Self {
			db_dir: PathBuf::from(lookup("TICKETMAIL_DB_DIR").unwrap_or(DEFAULT_DB_DIR.into())),
			template_dir: PathBuf::from(
				lookup("TICKETMAIL_TEMPLATE_DIR").unwrap_or(DEFAULT_TEMPLATE_DIR.into()),
			),
			settings_cache,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	#[test]
	fn test_defaults() {
		let config = Config::from_lookup(|_| None).unwrap();
		assert_eq!(config.db_dir, PathBuf::from("./data"));
		assert_eq!(config.template_dir, PathBuf::from("./templates/email"));
		assert_eq!(config.settings_cache, 100);
	}

	#[test]
	fn test_overrides() {
		let vars = HashMap::from([
			("TICKETMAIL_DB_DIR", "/var/lib/ticketmail"),
			("TICKETMAIL_SETTINGS_CACHE", " 20 "),
		]);
		let config = Config::from_lookup(|k| vars.get(k).map(|v| (*v).to_string())).unwrap();
		assert_eq!(config.db_dir, PathBuf::from("/var/lib/ticketmail"));
		assert_eq!(config.settings_cache, 20);
	}

	#[test]
	fn test_bad_cache_size() {
		let res = Config::from_lookup(|k| (k == "TICKETMAIL_SETTINGS_CACHE").then(|| "lots".into()));
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}
}

// vim: ts=4
