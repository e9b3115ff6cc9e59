//! Markdown rendering of a kept conversation.
//!
//! The layout is fixed so repeated exports of the same conversation are
//! byte-identical:
//!
//! ```text
//! # {title}
//!
//! **Created:** 2025-06-17 10:00:00
//! **Updated:** 2025-06-17 10:05:00
//! **Messages:** 2
//!
//! ## Human
//!
//! {content}
//!
//! ## Assistant
//!
//! {content}
//! ```
//!
//! The Created/Updated lines end with two spaces (markdown hard line break).
//! Extracted text is wrapped, never rewritten: no escaping, no truncation.

use crate::archive::{Conversation, extract_content};
use chrono::DateTime;

const UNTITLED: &str = "Untitled Conversation";

/// Render a conversation into the full note document. Call only for
/// conversations the filter decided to keep. `tags` appends a trailing
/// `[[tag]]` line per entry; the renderer itself never invents tags.
pub fn render(conversation: &Conversation, tags: Option<&[String]>) -> String {
    let title = if conversation.name.trim().is_empty() {
        UNTITLED
    } else {
        conversation.name.as_str()
    };

    let sections: Vec<(&'static str, String)> = conversation
        .chat_messages
        .iter()
        .filter_map(|message| {
            let content = extract_content(message);
            if content.is_empty() {
                None
            } else {
                Some((message.sender.label(), content))
            }
        })
        .collect();

    let mut doc = String::new();
    doc.push_str(&format!("# {}\n\n", title));
    doc.push_str(&format!(
        "**Created:** {}  \n",
        format_timestamp(&conversation.created_at)
    ));
    doc.push_str(&format!(
        "**Updated:** {}  \n",
        format_timestamp(&conversation.updated_at)
    ));
    doc.push_str(&format!("**Messages:** {}\n", sections.len()));

    for (label, content) in &sections {
        doc.push_str(&format!("\n## {}\n\n{}\n", label, content));
    }

    if let Some(tags) = tags
        && !tags.is_empty()
    {
        doc.push('\n');
        for tag in tags {
            doc.push_str(&format!("[[{}]]\n", tag));
        }
    }

    doc
}

/// `YYYY-MM-DD HH:MM:SS` in the timestamp's recorded offset; an unparseable
/// value is rendered verbatim rather than failing the note.
fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Conversation;

    fn sample() -> Conversation {
        serde_json::from_str(
            r#"{
                "uuid": "c1",
                "name": "Trip planning",
                "created_at": "2025-06-17T10:00:00Z",
                "updated_at": "2025-06-17T10:05:00Z",
                "chat_messages": [
                    {"sender": "human", "text": "Where to?"},
                    {"sender": "assistant", "text": "Somewhere warm."}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn renders_exact_document() {
        let expected = "# Trip planning\n\
                        \n\
                        **Created:** 2025-06-17 10:00:00  \n\
                        **Updated:** 2025-06-17 10:05:00  \n\
                        **Messages:** 2\n\
                        \n\
                        ## Human\n\
                        \n\
                        Where to?\n\
                        \n\
                        ## Assistant\n\
                        \n\
                        Somewhere warm.\n";
        assert_eq!(render(&sample(), None), expected);
    }

    #[test]
    fn rendering_is_idempotent() {
        let conv = sample();
        assert_eq!(render(&conv, None), render(&conv, None));
    }

    #[test]
    fn blank_title_falls_back() {
        let mut conv = sample();
        conv.name = "  ".to_string();
        assert!(render(&conv, None).starts_with("# Untitled Conversation\n"));
    }

    #[test]
    fn empty_messages_are_omitted_and_not_counted() {
        let conv: Conversation = serde_json::from_str(
            r#"{
                "uuid": "c1",
                "name": "t",
                "created_at": "2025-06-17T10:00:00Z",
                "updated_at": "2025-06-17T10:05:00Z",
                "chat_messages": [
                    {"sender": "human", "text": "hi"},
                    {"sender": "assistant"},
                    {"sender": "assistant", "text": "hello"}
                ]
            }"#,
        )
        .unwrap();
        let doc = render(&conv, None);
        assert!(doc.contains("**Messages:** 2\n"));
        assert_eq!(doc.matches("\n## ").count(), 2);
    }

    #[test]
    fn unrecognized_sender_renders_generic_label() {
        let conv: Conversation = serde_json::from_str(
            r#"{
                "uuid": "c1",
                "name": "t",
                "created_at": "2025-06-17T10:00:00Z",
                "updated_at": "2025-06-17T10:05:00Z",
                "chat_messages": [
                    {"sender": "moderator", "text": "notice"},
                    {"sender": "assistant", "text": "ok"}
                ]
            }"#,
        )
        .unwrap();
        assert!(render(&conv, None).contains("\n## Unknown\n\nnotice\n"));
    }

    #[test]
    fn unparseable_updated_at_is_rendered_verbatim() {
        let mut conv = sample();
        conv.updated_at = "not-a-date".to_string();
        assert!(render(&conv, None).contains("**Updated:** not-a-date  \n"));
    }

    #[test]
    fn tags_append_after_blank_line() {
        let tags = vec!["claude".to_string(), "travel".to_string()];
        let doc = render(&sample(), Some(&tags));
        assert!(doc.ends_with("Somewhere warm.\n\n[[claude]]\n[[travel]]\n"));
    }

    #[test]
    fn no_tags_leaves_body_without_tag_section() {
        let doc = render(&sample(), Some(&[]));
        assert!(!doc.contains("[["));
        assert_eq!(doc, render(&sample(), None));
    }

    #[test]
    fn round_trip_title_and_count_match_source() {
        let conv = sample();
        let doc = render(&conv, None);

        let title = doc
            .lines()
            .next()
            .and_then(|l| l.strip_prefix("# "))
            .unwrap();
        assert_eq!(title, conv.name);

        let counted: usize = doc
            .lines()
            .find_map(|l| l.strip_prefix("**Messages:** "))
            .and_then(|n| n.parse().ok())
            .unwrap();
        let with_content = conv
            .chat_messages
            .iter()
            .filter(|m| !crate::archive::extract_content(m).is_empty())
            .count();
        assert_eq!(counted, with_content);
    }

    #[test]
    fn content_is_not_rewritten() {
        let conv: Conversation = serde_json::from_str(
            r###"{
                "uuid": "c1",
                "name": "t",
                "created_at": "2025-06-17T10:00:00Z",
                "updated_at": "2025-06-17T10:05:00Z",
                "chat_messages": [
                    {"sender": "human", "text": "code: `a < b && c > d`"},
                    {"sender": "assistant", "text": "## not a header? *stays*"}
                ]
            }"###,
        )
        .unwrap();
        let doc = render(&conv, None);
        assert!(doc.contains("code: `a < b && c > d`\n"));
        assert!(doc.contains("## not a header? *stays*\n"));
    }
}
