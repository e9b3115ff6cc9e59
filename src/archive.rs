/// Type definitions for the Claude data-export archive schema.
///
/// The archive is a single `conversations.json` file: a JSON array of
/// conversation records. The schema is loosely typed — the same logical
/// content may arrive in a message's direct `text` field, in a `content`
/// block, or only as attachment `extracted_content`, depending on export
/// vintage. Every field except `uuid` is therefore optional-with-default,
/// and unknown fields are ignored rather than rejected.
use eyre::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One exported conversation thread. Immutable once parsed; the pipeline
/// only derives values (filter decision, rendered note, filename) from it.
#[derive(Debug, Clone, Deserialize)]
pub struct Conversation {
    pub uuid: String,
    /// Human-supplied title, possibly empty or whitespace-only.
    #[serde(default)]
    pub name: String,
    /// RFC 3339 timestamps, kept as raw strings. Parsing is deferred to the
    /// consumers so an unparseable value stays opaque instead of failing
    /// the whole archive.
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    /// Insertion order is chronological order and must be preserved.
    #[serde(default)]
    pub chat_messages: Vec<ChatMessage>,
}

/// One turn in a conversation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub sender: Sender,
    /// Direct convenience field; less reliable than the content blocks.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Message author role. Exports occasionally carry senders outside the
/// documented pair; those deserialize to `Unknown` and render under a
/// generic label instead of failing the conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Human,
    Assistant,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Sender {
    /// Section label used in rendered markdown.
    pub fn label(self) -> &'static str {
        match self {
            Sender::Human => "Human",
            Sender::Assistant => "Assistant",
            Sender::Unknown => "Unknown",
        }
    }
}

/// One block of a message's `content` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub text: Option<String>,
    /// Present when the block carries attachment text extracted server-side.
    #[serde(default)]
    pub extracted_content: Option<String>,
}

/// A file attached to a message, with its server-extracted text if any.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub extracted_content: Option<String>,
}

/// Read and parse the archive file. Failure here is a setup error and fatal
/// to the run.
pub fn load_archive(path: &Path) -> Result<Vec<Conversation>> {
    let raw = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read archive: {}", path.display()))?;
    serde_json::from_str(&raw)
        .wrap_err_with(|| format!("Failed to parse archive: {}", path.display()))
}

/// Best-effort textual content of a message, first non-empty source wins:
///
/// 1. `content[0].extracted_content` — attachment text lifted into the block
/// 2. `content[0].text`
/// 3. the direct `text` field
/// 4. message-level attachments, each presented as an `[Attachment: name]`
///    header followed by its extracted text
/// 5. empty string
///
/// Block-level fields win over the top-level convenience field because
/// exports populate them inconsistently; attachments carry content that is
/// not present in `text` at all. Never fails: a message with no retrievable
/// text is a valid state, not an error.
pub fn extract_content(message: &ChatMessage) -> String {
    if let Some(block) = message.content.first() {
        if let Some(extracted) = &block.extracted_content
            && !extracted.is_empty()
        {
            return extracted.clone();
        }
        if let Some(text) = &block.text
            && !text.is_empty()
        {
            return text.clone();
        }
    }

    if let Some(text) = &message.text
        && !text.is_empty()
    {
        return text.clone();
    }

    let attachment_parts: Vec<String> = message
        .attachments
        .iter()
        .filter_map(|att| {
            let extracted = att.extracted_content.as_deref().filter(|s| !s.is_empty())?;
            let name = att.file_name.as_deref().unwrap_or("file");
            Some(format!("[Attachment: {}]\n\n{}", name, extracted))
        })
        .collect();
    if !attachment_parts.is_empty() {
        return attachment_parts.join("\n\n");
    }

    String::new()
}
