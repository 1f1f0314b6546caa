//! Ticket creation date parsing
//!
//! Creation dates arrive as free text in whatever shape the export produced.
//! Parsing runs an ordered chain of attempts and the first success wins:
//!
//! 1. Fixed formats, 4-digit years first, then the same shapes with 2-digit
//!    years: ISO (`2026-02-13`), German (`13.02.2026`), slash (`13/02/2026`),
//!    US (`02/13/2026`). The whole input must be consumed and the year must be
//!    within 1970..=2099, so `26-02-13` is never read as the year 26.
//! 2. A permissive pass over common date-time shapes and relative words.
//!
//! The result is a calendar date, time of day is always midnight.

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, NaiveDateTime, NaiveTime};

pub const MIN_YEAR: i32 = 1970;
pub const MAX_YEAR: i32 = 2099;

/// Fixed formats in the order they are tried
const FIXED_FORMATS: [&str; 8] = [
	"%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%m/%d/%Y", "%y-%m-%d", "%d.%m.%y", "%d/%m/%y", "%m/%d/%y",
];

/// Date-time shapes accepted by the permissive pass; the time part is dropped
const PERMISSIVE_DATETIME_FORMATS: [&str; 8] = [
	"%Y-%m-%d %H:%M:%S",
	"%Y-%m-%d %H:%M",
	"%Y-%m-%dT%H:%M:%S",
	"%Y-%m-%dT%H:%M",
	"%d.%m.%Y %H:%M:%S",
	"%d.%m.%Y %H:%M",
	"%d/%m/%Y %H:%M:%S",
	"%d/%m/%Y %H:%M",
];

/// Long-form date shapes accepted by the permissive pass
const PERMISSIVE_DATE_FORMATS: [&str; 5] =
	["%d %B %Y", "%B %d, %Y", "%d %b %Y", "%b %d, %Y", "%Y%m%d"];

type Attempt = fn(&str) -> Option<NaiveDate>;

const PARSE_CHAIN: [Attempt; 2] = [parse_fixed_format, parse_permissive];

/// Parse a ticket creation date, `None` if no attempt succeeds
pub fn parse_ticket_date(input: &str) -> Option<NaiveDate> {
	let input = input.trim();
	if input.is_empty() {
		return None;
	}
	PARSE_CHAIN.iter().find_map(|attempt| attempt(input))
}

/// The parsed date at 00:00:00
pub fn at_midnight(date: NaiveDate) -> NaiveDateTime {
	date.and_time(NaiveTime::MIN)
}

fn year_in_range(date: &NaiveDate) -> bool {
	(MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

/// Strict pass over the fixed format list
pub fn parse_fixed_format(input: &str) -> Option<NaiveDate> {
	FIXED_FORMATS.iter().find_map(|fmt| {
		NaiveDate::parse_from_str(input, fmt).ok().filter(year_in_range)
	})
}

/// Lenient pass: timestamps with a time part, long month names, relative words
pub fn parse_permissive(input: &str) -> Option<NaiveDate> {
	let today = Local::now().date_naive();
	if let Some(date) = parse_relative(input, today) {
		return Some(date);
	}

	if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
		return Some(dt.date_naive());
	}
	if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
		return Some(dt.date_naive());
	}

	PERMISSIVE_DATETIME_FORMATS
		.iter()
		.find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok().map(|dt| dt.date()))
		.or_else(|| {
			PERMISSIVE_DATE_FORMATS
				.iter()
				.find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
		})
}

fn parse_relative(input: &str, today: NaiveDate) -> Option<NaiveDate> {
	match input.to_ascii_lowercase().as_str() {
		"today" | "now" | "heute" => Some(today),
		"yesterday" | "gestern" => today.checked_sub_days(Days::new(1)),
		"tomorrow" | "morgen" => today.checked_add_days(Days::new(1)),
		_ => None,
	}
}


// vim: ts=4
