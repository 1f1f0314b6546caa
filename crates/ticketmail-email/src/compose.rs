//! Message composition: placeholder substitution, test banner, plain-text body

use chrono::{Days, Locale, NaiveDate, NaiveTime};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::str::FromStr;

use crate::prelude::*;
use ticketmail_types::meta_adapter::Contact;
use ticketmail_types::ticket::TicketData;
use ticketmail_types::utils::non_blank;

/// Prefix of every subject composed in test mode
pub const TEST_SUBJECT_PREFIX: &str = "[TEST] ";

const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([A-Za-z][A-Za-z0-9_]*)\s*\}\}";
const ANCHOR_PATTERN: &str = r#"(?is)<a\s[^>]*?href\s*=\s*"([^"]*)"[^>]*>(.*?)</a\s*>"#;
const BREAK_PATTERN: &str = r"(?i)<br\s*/?>|</p\s*>|</div\s*>|</li\s*>|</h[1-6]\s*>";
const TAG_PATTERN: &str = r"(?s)<[^>]*>";

/// Language of localized text (due date, test banner)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLocale {
	De,
	En,
}

impl DateLocale {
	pub fn lang(self) -> &'static str {
		match self {
			DateLocale::De => "de",
			DateLocale::En => "en",
		}
	}

	fn long_date(self, date: NaiveDate) -> String {
		let (fmt, locale) = match self {
			DateLocale::De => ("%-d. %B %Y", Locale::de_DE),
			DateLocale::En => ("%B %-d, %Y", Locale::en_US),
		};
		date.and_time(NaiveTime::MIN).and_utc().format_localized(fmt, locale).to_string()
	}

	fn banner(self, recipient: &str) -> String {
		match self {
			DateLocale::De => format!("TESTVERSAND: Diese Nachricht wäre an {} gegangen.", recipient),
			DateLocale::En => format!("TEST MODE: This message would have been sent to {}.", recipient),
		}
	}
}

impl FromStr for DateLocale {
	type Err = Error;

	fn from_str(s: &str) -> ClResult<Self> {
		match s.trim().to_ascii_lowercase().as_str() {
			"de" | "de_de" | "de-de" => Ok(DateLocale::De),
			"en" | "en_us" | "en-us" | "en_gb" | "en-gb" => Ok(DateLocale::En),
			other => Err(Error::ConfigError(format!("Unsupported locale '{}'", other))),
		}
	}
}

/// Everything a message is composed from
#[derive(Debug, Clone, Copy)]
pub struct ComposeRequest<'a> {
	pub template: &'a str,
	pub subject: &'a str,
	pub ticket: &'a TicketData,
	/// Real requester; named in the test banner
	pub contact: Option<&'a Contact>,
	pub test_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
	pub subject: String,
	pub html_body: String,
	pub text_body: String,
}

/// Placeholder values of one ticket
#[derive(Debug)]
struct Values<'a> {
	ticket_id: &'a str,
	ticket_name: &'a str,
	username: &'a str,
	requester_name: &'a str,
	ticket_link: String,
	due_date: String,
	created: &'a str,
}

impl Values<'_> {
	fn get(&self, key: &str) -> Option<&str> {
		Some(match key {
			"ticketId" => self.ticket_id,
			"ticketName" => self.ticket_name,
			"username" => self.username,
			"requesterName" => self.requester_name,
			"ticketLink" => self.ticket_link.as_str(),
			"dueDate" => self.due_date.as_str(),
			"created" => self.created,
			_ => return None,
		})
	}
}

pub struct Composer {
	base_url: String,
	locale: DateLocale,
	due_days: u64,
	placeholder: Regex,
	anchor: Regex,
	line_break: Regex,
	tag: Regex,
}

impl Composer {
	pub fn new(base_url: &str, locale: DateLocale, due_days: u64) -> ClResult<Self> {
		let compile = |pattern: &str| {
			Regex::new(pattern).map_err(|e| Error::Internal(format!("invalid pattern: {}", e)))
		};
		Ok(Self {
			base_url: base_url.trim().to_string(),
			locale,
			due_days,
			placeholder: compile(PLACEHOLDER_PATTERN)?,
			anchor: compile(ANCHOR_PATTERN)?,
			line_break: compile(BREAK_PATTERN)?,
			tag: compile(TAG_PATTERN)?,
		})
	}

	pub fn locale(&self) -> DateLocale {
		self.locale
	}

	/// `base_url/ticket_id`, with exactly one slash in between
	pub fn ticket_link(&self, ticket_id: &str) -> String {
		format!("{}/{}", self.base_url.trim_end_matches('/'), ticket_id.trim_start_matches('/'))
	}

	/// Due date `today + due_days` in the configured long form
	pub fn due_date(&self, today: NaiveDate) -> String {
		let due = today.checked_add_days(Days::new(self.due_days)).unwrap_or(today);
		self.locale.long_date(due)
	}

	fn values<'a>(&self, req: &ComposeRequest<'a>, today: NaiveDate) -> Values<'a> {
		let ticket = req.ticket;
		let requester_name = req
			.contact
			.and_then(|c| c.display_name.as_deref())
			.and_then(non_blank)
			.unwrap_or_else(|| ticket.username());
		Values {
			ticket_id: ticket.ticket_id(),
			ticket_name: ticket.ticket_name().unwrap_or_default(),
			username: ticket.username(),
			requester_name,
			ticket_link: self.ticket_link(ticket.ticket_id()),
			due_date: self.due_date(today),
			created: ticket.created().unwrap_or_default(),
		}
	}

	fn render_subject(&self, req: &ComposeRequest<'_>, values: &Values<'_>) -> String {
		let subject = self.substitute(req.subject, values, false);
		let subject = subject.split_whitespace().collect::<Vec<_>>().join(" ");
		if req.test_mode { format!("{}{}", TEST_SUBJECT_PREFIX, subject) } else { subject }
	}

	/// Subject line only, single-line and prefixed in test mode
	pub fn subject(&self, req: &ComposeRequest<'_>, today: NaiveDate) -> String {
		self.render_subject(req, &self.values(req, today))
	}

	pub fn compose(&self, req: &ComposeRequest<'_>, today: NaiveDate) -> ComposedMessage {
		let values = self.values(req, today);
		let subject = self.render_subject(req, &values);

		let html = self.substitute(req.template, &values, true);
		let mut text = self.to_text(&self.substitute(req.template, &values, false));
		let mut html_body = html.into_owned();

		if req.test_mode {
			if let Some(recipient) = req.contact.and_then(Contact::email) {
				let banner = self.locale.banner(recipient);
				html_body = format!(
					"<p style=\"background:#fff3cd;border:1px solid #e0a800;padding:8px\"><strong>{}</strong></p>\n{}",
					escape_html(&banner),
					html_body
				);
				text = format!("{}\n\n{}", banner, text);
			}
		}

		ComposedMessage { subject, html_body, text_body: text }
	}

	/// Replace known placeholders; unknown ones stay as written
	fn substitute<'t>(&self, template: &'t str, values: &Values<'_>, html: bool) -> Cow<'t, str> {
		self.placeholder.replace_all(template, |caps: &Captures<'_>| match values.get(&caps[1]) {
			Some(value) if html => escape_html(value),
			Some(value) => value.to_string(),
			None => caps[0].to_string(),
		})
	}

	/// Plain-text rendition of an HTML body
	fn to_text(&self, html: &str) -> String {
		let text = self.anchor.replace_all(html, |caps: &Captures<'_>| {
			let label = self.tag.replace_all(&caps[2], "");
			if label.trim() == caps[1].trim() {
				caps[1].to_string()
			} else {
				format!("{} ({})", label.trim(), &caps[1])
			}
		});
		let text = self.line_break.replace_all(&text, "\n");
		let text = self.tag.replace_all(&text, "");
		let text = unescape_html(&text);

		let mut out = String::with_capacity(text.len());
		let mut blank_run = 0;
		for line in text.lines().map(str::trim) {
			if line.is_empty() {
				blank_run += 1;
				if blank_run > 1 || out.is_empty() {
					continue;
				}
			} else {
				blank_run = 0;
			}
			out.push_str(line);
			out.push('\n');
		}
		out.trim_end().to_string()
	}
}

pub fn escape_html(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			c => out.push(c),
		}
	}
	out
}

fn unescape_html(s: &str) -> String {
	s.replace("&nbsp;", " ")
		.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&#39;", "'")
		.replace("&amp;", "&")
}


// vim: ts=4
