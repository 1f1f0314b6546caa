//! Utility functions

/// Truncate to at most `max` characters, never splitting a UTF-8 sequence.
///
/// Idempotent: truncating an already truncated value returns it unchanged.
pub fn truncate_chars(s: &str, max: usize) -> &str {
	match s.char_indices().nth(max) {
		Some((pos, _)) => &s[..pos],
		None => s,
	}
}

/// Trimmed value, or `None` for empty / whitespace-only input
pub fn non_blank(s: &str) -> Option<&str> {
	let s = s.trim();
	if s.is_empty() { None } else { Some(s) }
}


// vim: ts=4
