//! Settings subsystem with typed definitions, validation and caching
//!
//! # Architecture
//!
//! - **Types** (`types.rs`): Core type definitions and registry
//! - **Service** (`service.rs`): SettingsService with caching and validation
//!
//! Feature crates register their definitions into a `SettingsRegistry` at
//! start-up. The registry is then frozen and handed to the service, which
//! resolves values as stored value -> default.

pub mod service;
pub mod types;

pub use types::{
	FrozenSettingsRegistry, SettingDefinition, SettingDefinitionBuilder, SettingScope,
	SettingValue, SettingsRegistry,
};

// vim: ts=4
