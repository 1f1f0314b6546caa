//! Settings service with caching and validation

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

use ticketmail_types::meta_adapter::SettingsStore;

use super::types::{FrozenSettingsRegistry, SettingScope, SettingValue};
use crate::prelude::*;

const DEFAULT_CACHE_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(99);

/// LRU cache for settings values
pub struct SettingsCache {
	cache: parking_lot::Mutex<LruCache<String, Option<SettingValue>>>,
}

impl SettingsCache {
	pub fn new(capacity: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CACHE_SIZE);
		Self { cache: parking_lot::Mutex::new(LruCache::new(capacity)) }
	}

	pub fn get(&self, key: &str) -> Option<Option<SettingValue>> {
		self.cache.lock().get(key).cloned()
	}

	pub fn put(&self, key: String, value: Option<SettingValue>) {
		self.cache.lock().put(key, value);
	}

	pub fn invalidate(&self, key: &str) {
		self.cache.lock().pop(key);
	}

	pub fn clear(&self) {
		self.cache.lock().clear();
	}
}

/// Settings service - main interface for reading and changing settings
pub struct SettingsService {
	registry: Arc<FrozenSettingsRegistry>,
	cache: SettingsCache,
	store: Arc<dyn SettingsStore>,
}

impl SettingsService {
	pub fn new(
		registry: Arc<FrozenSettingsRegistry>,
		store: Arc<dyn SettingsStore>,
		cache_size: usize,
	) -> Self {
		Self { registry, cache: SettingsCache::new(cache_size), store }
	}

	/// Resolve a setting: stored value, then default, then `None`
	pub async fn resolve(&self, key: &str) -> ClResult<Option<SettingValue>> {
		if let Some(value) = self.cache.get(key) {
			debug!("Setting cache hit: {}", key);
			return Ok(value);
		}

		let def = self
			.registry
			.get(key)
			.ok_or_else(|| Error::ValidationError(format!("Unknown setting: {}", key)))?;

		let value = match def.scope {
			SettingScope::System => def.default.clone(),
			SettingScope::Global => match self.store.read_setting(key).await? {
				Some(json_value) => Some(serde_json::from_value::<SettingValue>(json_value).map_err(
					|e| Error::ValidationError(format!("Invalid setting value: {}", e)),
				)?),
				None => def.default.clone(),
			},
		};

		self.cache.put(key.to_string(), value.clone());
		Ok(value)
	}

	/// Get setting value, failing if it is neither stored nor defaulted
	pub async fn get(&self, key: &str) -> ClResult<SettingValue> {
		self.resolve(key).await?.ok_or_else(|| {
			Error::ConfigError(format!("Setting '{}' has no default and must be configured", key))
		})
	}

	/// Set setting value with validation
	pub async fn set(&self, key: &str, value: SettingValue) -> ClResult<()> {
		let def = self
			.registry
			.get(key)
			.ok_or_else(|| Error::ValidationError(format!("Unknown setting: {}", key)))?;

		if def.scope == SettingScope::System {
			return Err(Error::ValidationError(format!(
				"Setting '{}' is read-only at runtime",
				key
			)));
		}

		// Validate type matches definition (if default exists)
		if let Some(default) = &def.default {
			if !value.matches_type(default) {
				return Err(Error::ValidationError(format!(
					"Type mismatch for setting '{}': expected {}, got {}",
					key,
					default.type_name(),
					value.type_name()
				)));
			}
		}

		if let Some(validator) = &def.validator {
			validator(&value)?;
		}

		let json_value = serde_json::to_value(&value)
			.map_err(|e| Error::ValidationError(format!("Failed to serialize setting: {}", e)))?;
		self.store.update_setting(key, Some(json_value)).await?;
		self.cache.invalidate(key);

		info!("Setting '{}' updated", key);
		Ok(())
	}

	/// Delete a stored value (falls back to the default)
	pub async fn delete(&self, key: &str) -> ClResult<()> {
		if self.registry.get(key).is_none() {
			return Err(Error::ValidationError(format!("Unknown setting: {}", key)));
		}
		self.store.update_setting(key, None).await?;
		self.cache.invalidate(key);

		info!("Setting '{}' deleted", key);
		Ok(())
	}

	/// Validate that all required settings (no default and not optional) are configured
	pub async fn validate_required_settings(&self) -> ClResult<()> {
		for def in self.registry.list() {
			if def.optional || def.default.is_some() {
				continue;
			}

			if self.store.read_setting(&def.key).await?.is_none() {
				return Err(Error::ValidationError(format!(
					"Required setting '{}' is not configured",
					def.key
				)));
			}
		}
		Ok(())
	}

	/// Type-safe getters (required - returns error if not configured)
	pub async fn get_string(&self, key: &str) -> ClResult<String> {
		match self.get(key).await? {
			SettingValue::String(s) => Ok(s),
			v => Err(type_error(key, "a string", &v)),
		}
	}

	pub async fn get_int(&self, key: &str) -> ClResult<i64> {
		match self.get(key).await? {
			SettingValue::Int(i) => Ok(i),
			v => Err(type_error(key, "an integer", &v)),
		}
	}

	pub async fn get_bool(&self, key: &str) -> ClResult<bool> {
		match self.get(key).await? {
			SettingValue::Bool(b) => Ok(b),
			v => Err(type_error(key, "a boolean", &v)),
		}
	}

	/// Optional getter: `None` if unconfigured, error if it has the wrong type
	pub async fn get_string_opt(&self, key: &str) -> ClResult<Option<String>> {
		match self.resolve(key).await? {
			Some(SettingValue::String(s)) => Ok(Some(s)),
			Some(v) => Err(type_error(key, "a string", &v)),
			None => Ok(None),
		}
	}

	/// Get reference to registry (for listing all settings)
	pub fn registry(&self) -> &Arc<FrozenSettingsRegistry> {
		&self.registry
	}
}

fn type_error(key: &str, expected: &str, got: &SettingValue) -> Error {
	Error::ValidationError(format!("Setting '{}' is not {}, got {}", key, expected, got.type_name()))
}


// vim: ts=4
