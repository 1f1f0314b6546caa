//! App builder - wires storage, settings, events and the pipeline together

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use ticketmail_core::events::{EventBus, EventBusConfig};
use ticketmail_core::settings::SettingsRegistry;
use ticketmail_core::settings::service::SettingsService;
use ticketmail_dispatch::{Collaborators, DispatchConfig, Dispatcher, FieldMapping, Ingestor};
use ticketmail_email::{FsTemplateProvider, SmtpSender, TemplateResolver};
use ticketmail_meta_adapter_sqlite::MetaAdapterSqlite;
use ticketmail_types::error::ClResult;

pub fn init_tracing() {
	// A subscriber installed earlier (tests) stays in place
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.try_init();
}

pub struct App {
	pub config: Config,
	pub meta: Arc<MetaAdapterSqlite>,
	pub settings: Arc<SettingsService>,
	pub events: Arc<EventBus>,
}

pub struct AppBuilder {
	config: Config,
	events: EventBusConfig,
}

impl AppBuilder {
	pub fn new(config: Config) -> Self {
		AppBuilder { config, events: EventBusConfig::default() }
	}

	pub async fn build(&self) -> ClResult<App> {
		let meta = Arc::new(MetaAdapterSqlite::new(&self.config.db_dir).await?);

		let mut registry = SettingsRegistry::new();
		ticketmail_email::register_settings(
			&mut registry,
			&self.config.template_dir.to_string_lossy(),
		)?;
		ticketmail_dispatch::register_settings(&mut registry)?;
		info!("Registered {} settings", registry.len());

		let settings = Arc::new(SettingsService::new(
			Arc::new(registry.freeze()),
			meta.clone(),
			self.config.settings_cache,
		));
		settings.validate_required_settings().await?;

		Ok(App {
			config: self.config.clone(),
			meta,
			settings,
			events: Arc::new(EventBus::with_config(&self.events)),
		})
	}
}

impl App {
	pub async fn ingestor(&self) -> ClResult<Ingestor> {
		Ok(Ingestor::new(FieldMapping::load(&self.settings).await?))
	}

	async fn fallback_templates(&self) -> ClResult<Arc<FsTemplateProvider>> {
		let locale = DispatchConfig::load(&self.settings).await?.locale;
		let dir = self.settings.get_string("email.template_dir").await?;
		Ok(Arc::new(FsTemplateProvider::new(dir, Some(locale.lang()))))
	}

	pub async fn template_resolver(&self) -> ClResult<TemplateResolver> {
		Ok(TemplateResolver::load(self.meta.clone(), self.fallback_templates().await?).await)
	}

	/// Pipeline over the SQLite stores, SMTP and the event bus
	pub async fn dispatcher(&self) -> ClResult<Dispatcher> {
		let config = DispatchConfig::load(&self.settings).await?;
		Dispatcher::new(
			Collaborators {
				directory: self.meta.clone(),
				outcomes: self.meta.clone(),
				templates: self.meta.clone(),
				fallback: self.fallback_templates().await?,
				transport: Arc::new(SmtpSender::new(self.settings.clone())),
				sink: self.events.clone(),
			},
			config,
		)
	}

	pub async fn close(&self) {
		self.meta.close().await;
	}
}


// vim: ts=4
