//! # claude-chat-notes
//!
//! A CLI tool that converts a [Claude](https://claude.ai) data-export archive
//! into individual Markdown note files.
//!
//! ## What it does
//!
//! A Claude data export contains a `conversations.json` file: one JSON array
//! holding every conversation with its messages. This tool reads that
//! archive, drops conversations that are not worth keeping (no messages, no
//! extractable text, or an unanswered one-sided exchange), and writes each
//! remaining conversation as a standalone Markdown note named
//! `YYYY-MM-DD_Title.md` so a directory listing sorts chronologically.
//!
//! The archive is only ever read — your export is never modified.
//!
//! ## Tagging
//!
//! A second pass (`claude-chat-notes tag`) asks an external command to
//! suggest semantic tags for each note and appends them as `[[tag]]` lines.
//! The command's output is checked before anything is written: the note body
//! must come back byte-identical, tags must be lowercase single words, and
//! the replacement file is staged and atomically renamed into place. A
//! misbehaving tagger cannot corrupt a note.
//!
//! ## Usage
//!
//! ```sh
//! # Export all conversations to a directory
//! claude-chat-notes export ~/notes/claude --archive ~/Downloads/data/conversations.json
//!
//! # Tag the first 10 notes using the default `claude` command
//! claude-chat-notes tag ~/notes/claude --limit 10
//! ```
//!
//! Preferences can be persisted in `~/.config/claude-chat-notes/config.toml`.

pub mod archive;
pub mod filter;
pub mod naming;
pub mod process;
pub mod renderer;
pub mod tagger;
