//! Date-scoped template resolution
//!
//! A ticket gets the template whose `valid_from` is the first one on or after
//! its creation date. The fallback chain, in order:
//!
//! 1. date match in the template store
//! 2. the stored template with the latest `valid_from`
//! 3. the filesystem template (`<dir>/ticket_closed[.<lang>].html`)
//! 4. the built-in default
//!
//! Store failures during resolution are logged and treated as "no template",
//! so resolution itself never fails.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::date::parse_ticket_date;
use crate::prelude::*;
use ticketmail_types::meta_adapter::{Template, TemplateStore};
use ticketmail_types::utils::non_blank;

/// Base name of the filesystem fallback template
pub const FALLBACK_TEMPLATE_NAME: &str = "ticket_closed";

pub const DEFAULT_TEMPLATE: &str = "<p>Hello {{requesterName}},</p>\n\
<p>your ticket <a href=\"{{ticketLink}}\">{{ticketId}}</a> ({{ticketName}}) has been closed.</p>\n\
<p>We would appreciate your feedback until {{dueDate}}.</p>\n";

/// Metadata extracted from template frontmatter
#[derive(Debug, Default, Deserialize)]
pub struct TemplateMetadata {
	/// Email subject line, overrides the configured subject
	#[serde(default)]
	pub subject: Option<String>,
}

/// Template text provided outside the template store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackTemplate {
	pub name: String,
	pub content: String,
	pub subject: Option<String>,
}

/// Source of the template used when the store has none
pub trait FallbackTemplateProvider: Send + Sync {
	fn fallback_template(&self) -> Option<FallbackTemplate>;
}

/// Loads the fallback template from a directory, with language fallback
pub struct FsTemplateProvider {
	template_dir: PathBuf,
	lang: Option<String>,
}

impl FsTemplateProvider {
	pub fn new(template_dir: impl Into<PathBuf>, lang: Option<&str>) -> Self {
		Self { template_dir: template_dir.into(), lang: lang.map(str::to_string) }
	}

	/// Parse YAML frontmatter from template content
	///
	/// Frontmatter is delimited by `---` at the start of the file:
	/// ```text
	/// ---
	/// subject: Your ticket {{ticketId}} was closed
	/// ---
	/// Template content here...
	/// ```
	///
	/// Returns (metadata, content_without_frontmatter)
	pub fn parse_frontmatter(content: &str) -> (TemplateMetadata, &str) {
		let content = content.trim_start();

		let Some(after_first) = content.strip_prefix("---") else {
			return (TemplateMetadata::default(), content);
		};

		if let Some(end_pos) = after_first.find("\n---") {
			let yaml_content = &after_first[..end_pos];
			let template_content = &after_first[end_pos + 4..]; // Skip "\n---"

			match serde_yaml::from_str(yaml_content) {
				Ok(metadata) => (metadata, template_content.trim_start_matches(['\r', '\n'])),
				Err(e) => {
					warn!("Failed to parse frontmatter YAML: {}", e);
					(TemplateMetadata::default(), content)
				}
			}
		} else {
			// No closing delimiter found
			(TemplateMetadata::default(), content)
		}
	}

	fn try_load_template(path: &Path) -> Option<String> {
		std::fs::read_to_string(path).ok()
	}

	/// Resolve template path with language fallback
	///
	/// For lang "de":
	/// 1. Try: ticket_closed.de.html
	/// 2. Fallback: ticket_closed.html
	fn load(&self) -> Option<(PathBuf, String)> {
		if let Some(lang) = &self.lang {
			let lang_path =
				self.template_dir.join(format!("{}.{}.html", FALLBACK_TEMPLATE_NAME, lang));
			if let Some(content) = Self::try_load_template(&lang_path) {
				debug!("Loaded language-specific template: {}", lang_path.display());
				return Some((lang_path, content));
			}
		}

		let default_path = self.template_dir.join(format!("{}.html", FALLBACK_TEMPLATE_NAME));
		let content = Self::try_load_template(&default_path)?;
		debug!("Loaded default template: {}", default_path.display());
		Some((default_path, content))
	}
}

impl FallbackTemplateProvider for FsTemplateProvider {
	fn fallback_template(&self) -> Option<FallbackTemplate> {
		let (path, raw) = self.load()?;
		let (metadata, body) = Self::parse_frontmatter(&raw);
		if body.trim().is_empty() {
			warn!("Ignoring empty template file {}", path.display());
			return None;
		}
		Some(FallbackTemplate {
			name: path.display().to_string(),
			content: body.to_string(),
			subject: metadata.subject,
		})
	}
}

/// Why resolution could not use the ticket's own date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
	NoCreatedDate,
	ParseFailed,
	NoDateMatch,
}

impl FallbackReason {
	pub fn as_str(&self) -> &'static str {
		match self {
			FallbackReason::NoCreatedDate => "no_created_date",
			FallbackReason::ParseFailed => "parse_failed",
			FallbackReason::NoDateMatch => "no_date_match",
		}
	}
}

/// Which step of the fallback chain produced the template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMethod {
	DateMatch,
	FallbackLatest(FallbackReason),
	FallbackFilesystem(FallbackReason),
	FallbackDefault(FallbackReason),
}

impl std::fmt::Display for ResolutionMethod {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ResolutionMethod::DateMatch => f.write_str("date_match"),
			ResolutionMethod::FallbackLatest(r) => write!(f, "{} → fallback_latest", r.as_str()),
			ResolutionMethod::FallbackFilesystem(r) => {
				write!(f, "{} → fallback_filesystem", r.as_str())
			}
			ResolutionMethod::FallbackDefault(r) => write!(f, "{} → fallback_default", r.as_str()),
		}
	}
}

impl Serialize for ResolutionMethod {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.collect_str(self)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSnapshot {
	pub id: i64,
	pub name: String,
	pub valid_from: NaiveDate,
}

/// Diagnostics of one resolution, for operators only
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionTrace {
	pub input: Option<String>,
	pub parsed: Option<NaiveDate>,
	pub method: ResolutionMethod,
	pub templates: Vec<TemplateSnapshot>,
}

#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
	/// Store id, `None` for filesystem and built-in templates
	pub template_id: Option<i64>,
	pub name: String,
	pub content: String,
	/// Subject from template frontmatter, if any
	pub subject: Option<String>,
	pub trace: ResolutionTrace,
}

#[derive(Debug, Clone, Copy)]
enum Step {
	ForDate,
	Latest,
	Filesystem,
	Default,
}

const CHAIN: [Step; 4] = [Step::ForDate, Step::Latest, Step::Filesystem, Step::Default];

/// Picks a template per ticket. Build one per batch.
pub struct TemplateResolver {
	store: Arc<dyn TemplateStore>,
	fallback: Arc<dyn FallbackTemplateProvider>,
	snapshot: Vec<TemplateSnapshot>,
}

impl TemplateResolver {
	/// Create a resolver, taking one snapshot of the known templates
	pub async fn load(
		store: Arc<dyn TemplateStore>,
		fallback: Arc<dyn FallbackTemplateProvider>,
	) -> Self {
		let snapshot = match store.list_templates().await {
			Ok(templates) => templates
				.into_iter()
				.map(|t| TemplateSnapshot { id: t.id, name: t.name, valid_from: t.valid_from })
				.collect(),
			Err(err) => {
				warn!("Cannot list templates for resolution trace: {}", err);
				Vec::new()
			}
		};
		Self { store, fallback, snapshot }
	}

	pub fn snapshot(&self) -> &[TemplateSnapshot] {
		&self.snapshot
	}

	/// Resolve the template for an optional raw creation date
	pub async fn resolve(&self, created: Option<&str>) -> ResolvedTemplate {
		let input = created.and_then(non_blank);
		let parsed = input.and_then(parse_ticket_date);
		let reason = match (input, parsed) {
			(None, _) => FallbackReason::NoCreatedDate,
			(Some(_), None) => FallbackReason::ParseFailed,
			(Some(_), Some(_)) => FallbackReason::NoDateMatch,
		};

		for step in CHAIN {
			if let Some(resolved) = self.attempt(step, parsed, reason, input).await {
				debug!(
					"Template resolution: input={:?} parsed={:?} method={} template={}",
					resolved.trace.input, resolved.trace.parsed, resolved.trace.method, resolved.name
				);
				return resolved;
			}
		}

		// The default step always yields
		self.built_in(parsed, reason, input)
	}

	async fn attempt(
		&self,
		step: Step,
		parsed: Option<NaiveDate>,
		reason: FallbackReason,
		input: Option<&str>,
	) -> Option<ResolvedTemplate> {
		match step {
			Step::ForDate => {
				let date = parsed?;
				let template = absorb(self.store.find_template_for_date(date).await)?;
				Some(self.stored(template, ResolutionMethod::DateMatch, parsed, input))
			}
			Step::Latest => {
				let template = absorb(self.store.find_latest_template().await)?;
				Some(self.stored(template, ResolutionMethod::FallbackLatest(reason), parsed, input))
			}
			Step::Filesystem => {
				let fb = self.fallback.fallback_template()?;
				Some(ResolvedTemplate {
					template_id: None,
					name: fb.name,
					content: fb.content,
					subject: fb.subject,
					trace: self.trace(ResolutionMethod::FallbackFilesystem(reason), parsed, input),
				})
			}
			Step::Default => Some(self.built_in(parsed, reason, input)),
		}
	}

	fn stored(
		&self,
		template: Template,
		method: ResolutionMethod,
		parsed: Option<NaiveDate>,
		input: Option<&str>,
	) -> ResolvedTemplate {
		ResolvedTemplate {
			template_id: Some(template.id),
			name: template.name,
			content: template.content,
			subject: None,
			trace: self.trace(method, parsed, input),
		}
	}

	fn built_in(
		&self,
		parsed: Option<NaiveDate>,
		reason: FallbackReason,
		input: Option<&str>,
	) -> ResolvedTemplate {
		ResolvedTemplate {
			template_id: None,
			name: "built-in default".into(),
			content: DEFAULT_TEMPLATE.into(),
			subject: None,
			trace: self.trace(ResolutionMethod::FallbackDefault(reason), parsed, input),
		}
	}

	fn trace(
		&self,
		method: ResolutionMethod,
		parsed: Option<NaiveDate>,
		input: Option<&str>,
	) -> ResolutionTrace {
		ResolutionTrace {
			input: input.map(str::to_string),
			parsed,
			method,
			templates: self.snapshot.clone(),
		}
	}
}

fn absorb(res: ClResult<Option<Template>>) -> Option<Template> {
	res.unwrap_or_else(|err| {
		warn!("Template store lookup failed, falling through: {}", err);
		None
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::sync::Mutex;
	use ticketmail_types::meta_adapter::TemplateData;

	#[derive(Debug, Default)]
	struct MemoryTemplates {
		templates: Mutex<Vec<Template>>,
		broken: bool,
	}

	impl MemoryTemplates {
		fn with(dates: &[(&str, &str)]) -> Self {
			let store = Self::default();
			for (name, date) in dates {
				let valid_from = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
				let mut list = store.templates.lock().unwrap();
				let id = i64::try_from(list.len()).unwrap() + 1;
				list.push(Template {
					id,
					name: (*name).to_string(),
					content: format!("template {}", name),
					valid_from,
					created_at: Timestamp(0),
					updated_at: Timestamp(0),
				});
			}
			store
		}

		fn fail(&self) -> ClResult<()> {
			if self.broken { Err(Error::DbError) } else { Ok(()) }
		}
	}

	#[async_trait]
	impl TemplateStore for MemoryTemplates {
		async fn list_templates(&self) -> ClResult<Vec<Template>> {
			self.fail()?;
			let mut list = self.templates.lock().unwrap().clone();
			list.sort_by_key(|t| (t.valid_from, t.id));
			Ok(list)
		}
		async fn read_template(&self, id: i64) -> ClResult<Template> {
			self.templates.lock().unwrap().iter().find(|t| t.id == id).cloned().ok_or(Error::NotFound)
		}
		async fn create_template(&self, _data: &TemplateData) -> ClResult<Template> {
			Err(Error::Internal("read-only".into()))
		}
		async fn update_template(&self, _id: i64, _data: &TemplateData) -> ClResult<Template> {
			Err(Error::Internal("read-only".into()))
		}
		async fn delete_template(&self, _id: i64) -> ClResult<()> {
			Err(Error::Internal("read-only".into()))
		}
		async fn find_template_for_date(&self, date: NaiveDate) -> ClResult<Option<Template>> {
			self.fail()?;
			let list = self.templates.lock().unwrap();
			Ok(list
				.iter()
				.filter(|t| t.valid_from >= date)
				.min_by_key(|t| (t.valid_from, std::cmp::Reverse(t.id)))
				.cloned())
		}
		async fn find_latest_template(&self) -> ClResult<Option<Template>> {
			self.fail()?;
			let list = self.templates.lock().unwrap();
			Ok(list.iter().max_by_key(|t| (t.valid_from, t.id)).cloned())
		}
	}

	struct NoFallback;

	impl FallbackTemplateProvider for NoFallback {
		fn fallback_template(&self) -> Option<FallbackTemplate> {
			None
		}
	}

	async fn resolver(store: MemoryTemplates) -> TemplateResolver {
		TemplateResolver::load(Arc::new(store), Arc::new(NoFallback)).await
	}

	#[tokio::test]
	async fn test_next_template_on_or_after_date() {
		let r = resolver(MemoryTemplates::with(&[("feb3", "2026-02-03"), ("feb13", "2026-02-13")]))
			.await;

		let res = r.resolve(Some("2026-02-10")).await;
		assert_eq!(res.name, "feb13");
		assert_eq!(res.trace.method, ResolutionMethod::DateMatch);

		// On the boundary the template itself matches
		let res = r.resolve(Some("03.02.2026")).await;
		assert_eq!(res.name, "feb3");
	}

	#[tokio::test]
	async fn test_after_all_templates_falls_back_to_latest() {
		let r = resolver(MemoryTemplates::with(&[("feb3", "2026-02-03"), ("feb13", "2026-02-13")]))
			.await;
		let res = r.resolve(Some("2026-02-20")).await;
		assert_eq!(res.name, "feb13");
		assert_eq!(res.trace.method.to_string(), "no_date_match → fallback_latest");
	}

	#[tokio::test]
	async fn test_missing_and_unparsable_dates_fall_back_to_latest() {
		let r = resolver(MemoryTemplates::with(&[("a", "2026-01-01"), ("b", "2026-03-01")])).await;

		let res = r.resolve(None).await;
		assert_eq!(res.name, "b");
		assert_eq!(res.trace.method.to_string(), "no_created_date → fallback_latest");

		let res = r.resolve(Some("not a date")).await;
		assert_eq!(res.name, "b");
		assert_eq!(res.trace.method.to_string(), "parse_failed → fallback_latest");
		assert_eq!(res.trace.input.as_deref(), Some("not a date"));
		assert_eq!(res.trace.parsed, None);
	}

	#[tokio::test]
	async fn test_trace_lists_all_templates() {
		let r = resolver(MemoryTemplates::with(&[("b", "2026-03-01"), ("a", "2026-01-01")])).await;
		let res = r.resolve(Some("2026-02-01")).await;
		let names: Vec<_> = res.trace.templates.iter().map(|t| t.name.as_str()).collect();
		assert_eq!(names, ["a", "b"]);
	}

	#[tokio::test]
	async fn test_equal_valid_from_prefers_newest() {
		let r = resolver(MemoryTemplates::with(&[("old", "2026-02-13"), ("new", "2026-02-13")]))
			.await;
		assert_eq!(r.resolve(Some("2026-02-01")).await.name, "new");
		assert_eq!(r.resolve(None).await.name, "new");
	}

	#[tokio::test]
	async fn test_empty_store_without_files_uses_built_in() {
		let r = resolver(MemoryTemplates::default()).await;
		let res = r.resolve(Some("13.02.26")).await;
		assert_eq!(res.template_id, None);
		assert_eq!(res.content, DEFAULT_TEMPLATE);
		assert_eq!(res.trace.method.to_string(), "no_date_match → fallback_default");
	}

	#[tokio::test]
	async fn test_store_failure_is_absorbed() {
		let store = MemoryTemplates { broken: true, ..MemoryTemplates::with(&[]) };
		let r = resolver(store).await;
		let res = r.resolve(Some("2026-02-13")).await;
		assert_eq!(res.content, DEFAULT_TEMPLATE);
		assert!(r.snapshot().is_empty());
	}

	#[tokio::test]
	async fn test_filesystem_fallback_with_language() {
		let dir = tempfile::TempDir::new().unwrap();
		std::fs::write(dir.path().join("ticket_closed.html"), "generic {{ticketId}}").unwrap();
		std::fs::write(
			dir.path().join("ticket_closed.de.html"),
			"---\nsubject: Ticket {{ticketId}} geschlossen\n---\nHallo {{username}}",
		)
		.unwrap();

		let fs = FsTemplateProvider::new(dir.path(), Some("de"));
		let r = TemplateResolver::load(Arc::new(MemoryTemplates::default()), Arc::new(fs)).await;
		let res = r.resolve(None).await;
		assert_eq!(res.content, "Hallo {{username}}");
		assert_eq!(res.subject.as_deref(), Some("Ticket {{ticketId}} geschlossen"));
		assert_eq!(res.trace.method.to_string(), "no_created_date → fallback_filesystem");

		let fs = FsTemplateProvider::new(dir.path(), Some("fr"));
		let fb = fs.fallback_template().unwrap();
		assert_eq!(fb.content, "generic {{ticketId}}");
		assert_eq!(fb.subject, None);
	}

	#[test]
	fn test_parse_frontmatter_basic() {
		let content = "---\nsubject: Test Subject\n---\nHello {{username}}!";
		let (metadata, template) = FsTemplateProvider::parse_frontmatter(content);
		assert_eq!(metadata.subject, Some("Test Subject".to_string()));
		assert_eq!(template, "Hello {{username}}!");
	}

	#[test]
	fn test_parse_frontmatter_no_frontmatter() {
		let (metadata, template) = FsTemplateProvider::parse_frontmatter("Hello {{username}}!");
		assert!(metadata.subject.is_none());
		assert_eq!(template, "Hello {{username}}!");
	}

	#[test]
	fn test_parse_frontmatter_unclosed() {
		let content = "---\nsubject: Test\nHello!";
		let (metadata, template) = FsTemplateProvider::parse_frontmatter(content);
		assert!(metadata.subject.is_none());
		assert_eq!(template, content);
	}
}

// vim: ts=4
