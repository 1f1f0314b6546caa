//! Meta adapter CRUD operation tests
//!
//! Tests create, read, update and delete for contacts, templates and settings
#![allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]

use chrono::NaiveDate;
use tempfile::TempDir;
use ticketmail_meta_adapter_sqlite::MetaAdapterSqlite;
use ticketmail_types::error::Error;
use ticketmail_types::meta_adapter::{
	Contact, RequesterDirectory, SettingsStore, TemplateData, TemplateStore,
};

async fn create_test_adapter() -> (MetaAdapterSqlite, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = MetaAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter");
	(adapter, temp_dir)
}

fn contact(username: &str, email: Option<&str>, excluded: bool) -> Contact {
	Contact {
		username: username.into(),
		email: email.map(str::to_string),
		display_name: None,
		excluded_from_notifications: excluded,
	}
}

fn template_data(name: &str, valid_from: &str) -> TemplateData {
	TemplateData {
		name: name.into(),
		content: format!("<p>{} {{{{ticketId}}}}</p>", name),
		valid_from: NaiveDate::parse_from_str(valid_from, "%Y-%m-%d").unwrap(),
	}
}

#[tokio::test]
async fn test_upsert_and_find_contact() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter.upsert_contact(&contact("alice", Some("alice@example.com"), false)).await.unwrap();
	let found = adapter.find_by_username("alice").await.unwrap().expect("alice exists");
	assert_eq!(found.email(), Some("alice@example.com"));
	assert!(!found.is_excluded_from_notifications());

	// Second upsert replaces the fields
	let mut updated = contact("alice", Some("a.smith@example.com"), true);
	updated.display_name = Some("Alice Smith".into());
	adapter.upsert_contact(&updated).await.unwrap();
	let found = adapter.find_by_username("alice").await.unwrap().unwrap();
	assert_eq!(found.email(), Some("a.smith@example.com"));
	assert_eq!(found.display_name.as_deref(), Some("Alice Smith"));
	assert!(found.is_excluded_from_notifications());

	assert!(adapter.find_by_username("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_contact_validation() {
	let (adapter, _temp) = create_test_adapter().await;
	assert!(matches!(
		adapter.upsert_contact(&contact(" ", None, false)).await,
		Err(Error::ValidationError(_))
	));
	assert!(matches!(
		adapter.upsert_contact(&contact("bob", Some("bob-at-example"), false)).await,
		Err(Error::ValidationError(_))
	));
	// A contact without email is allowed
	adapter.upsert_contact(&contact("bob", None, false)).await.unwrap();
	let bob = adapter.find_by_username("bob").await.unwrap().unwrap();
	assert_eq!(bob.email(), None);
}

#[tokio::test]
async fn test_find_multiple_contacts() {
	let (adapter, _temp) = create_test_adapter().await;
	for name in ["alice", "bob", "carol"] {
		adapter
			.upsert_contact(&contact(name, Some(&format!("{}@example.com", name)), false))
			.await
			.unwrap();
	}

	let mut found = adapter.find_by_usernames(&["carol", "alice", "zed"]).await.unwrap();
	found.sort_by(|a, b| a.username.cmp(&b.username));
	let names: Vec<_> = found.iter().map(|c| c.username.as_str()).collect();
	assert_eq!(names, ["alice", "carol"]);

	assert!(adapter.find_by_usernames(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_template_crud() {
	let (adapter, _temp) = create_test_adapter().await;

	let created = adapter.create_template(&template_data("Winter", "2026-01-15")).await.unwrap();
	assert_eq!(created.name, "Winter");
	assert_eq!(created.valid_from, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());

	let read = adapter.read_template(created.id).await.unwrap();
	assert_eq!(read, created);

	let updated = adapter
		.update_template(created.id, &template_data("Winter v2", "2026-01-20"))
		.await
		.unwrap();
	assert_eq!(updated.id, created.id);
	assert_eq!(updated.name, "Winter v2");

	adapter.delete_template(created.id).await.unwrap();
	assert!(matches!(adapter.read_template(created.id).await, Err(Error::NotFound)));
	assert!(matches!(adapter.delete_template(created.id).await, Err(Error::NotFound)));
	assert!(matches!(
		adapter.update_template(created.id, &template_data("x", "2026-01-01")).await,
		Err(Error::NotFound)
	));
}

#[tokio::test]
async fn test_template_requires_name_and_content() {
	let (adapter, _temp) = create_test_adapter().await;
	let mut data = template_data("", "2026-01-01");
	assert!(matches!(adapter.create_template(&data).await, Err(Error::ValidationError(_))));
	data.name = "ok".into();
	data.content = "  ".into();
	assert!(matches!(adapter.create_template(&data).await, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_settings_roundtrip_and_prefix() {
	let (adapter, _temp) = create_test_adapter().await;

	adapter.update_setting("email.smtp.port", Some(serde_json::json!(2525))).await.unwrap();
	adapter.update_setting("email.enabled", Some(serde_json::json!(true))).await.unwrap();
	adapter.update_setting("dispatch.locale", Some(serde_json::json!("en"))).await.unwrap();

	assert_eq!(
		adapter.read_setting("email.smtp.port").await.unwrap(),
		Some(serde_json::json!(2525))
	);

	let email = adapter.list_settings(Some("email.")).await.unwrap();
	assert_eq!(email.len(), 2);
	assert_eq!(adapter.list_settings(None).await.unwrap().len(), 3);

	adapter.update_setting("email.enabled", None).await.unwrap();
	assert_eq!(adapter.read_setting("email.enabled").await.unwrap(), None);
}

#[tokio::test]
async fn test_reopen_keeps_data() {
	let temp_dir = TempDir::new().unwrap();
	{
		let adapter = MetaAdapterSqlite::new(temp_dir.path()).await.unwrap();
		adapter.upsert_contact(&contact("dave", Some("dave@example.com"), false)).await.unwrap();
		adapter.close().await;
	}
	let adapter = MetaAdapterSqlite::new(temp_dir.path()).await.unwrap();
	assert!(adapter.find_by_username("dave").await.unwrap().is_some());
}

// vim: ts=4
