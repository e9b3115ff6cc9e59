//! Filename derivation for rendered notes.
//!
//! `{YYYY-MM-DD}_{sanitized title}.md`, deterministic and free of characters
//! that need escaping on common filesystems. The date prefix keeps a plain
//! directory listing in chronological order, which is why an unparseable
//! creation timestamp fails the conversation instead of silently producing
//! a dateless name.

use chrono::DateTime;
use std::fmt;

const MAX_TITLE_LEN: usize = 50;

/// Unparseable `created_at` value. The one per-conversation error the
/// pipeline reports and skips rather than degrades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampError {
    pub raw: String,
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unparseable created_at timestamp: {:?}", self.raw)
    }
}

impl std::error::Error for TimestampError {}

/// Derive the note filename from a conversation's title and creation
/// timestamp. The date is formatted in the timestamp's recorded offset,
/// not reinterpreted into UTC or local time.
pub fn derive_filename(title: &str, created_at: &str) -> Result<String, TimestampError> {
    let created = DateTime::parse_from_rfc3339(created_at).map_err(|_| TimestampError {
        raw: created_at.to_string(),
    })?;
    let date = created.format("%Y-%m-%d");
    Ok(format!("{}_{}.md", date, sanitize_title(title)))
}

/// Reduce a title to the filename-safe alphabet `[A-Za-z0-9-]` joined by
/// single underscores:
///
/// - characters outside `[A-Za-z0-9 _-]` become `_`
/// - runs of whitespace and underscores collapse to one `_`
/// - leading/trailing `_` are trimmed
/// - empty result becomes `untitled`
/// - truncated to 50 characters (code points, not bytes), then trimmed again
pub fn sanitize_title(title: &str) -> String {
    let mut sanitized = String::with_capacity(title.len());
    let mut pending_sep = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' {
            if pending_sep && !sanitized.is_empty() {
                sanitized.push('_');
            }
            pending_sep = false;
            sanitized.push(ch);
        } else {
            pending_sep = true;
        }
    }

    if sanitized.is_empty() {
        return "untitled".to_string();
    }

    if sanitized.chars().count() > MAX_TITLE_LEN {
        sanitized = sanitized.chars().take(MAX_TITLE_LEN).collect();
    }
    sanitized.trim_end_matches('_').to_string()
}
