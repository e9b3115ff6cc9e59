//! The export pipeline: archive in, one markdown note per kept
//! conversation out.
//!
//! Conversations are processed sequentially in archive order. Each one is
//! independent: a single malformed record is reported and skipped, never
//! aborting the batch. Only setup failures (missing or unparseable archive,
//! unwritable target directory) are fatal.

use crate::archive::{self, Conversation};
use crate::filter::{self, FilterReason};
use crate::naming;
use crate::renderer;
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

/// Configuration required to run the export.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
pub struct ExportConfig {
    pub archive_path: PathBuf,
    pub target_dir: PathBuf,
    pub tags: Option<Vec<String>>,
    pub verbose: bool,
    pub quiet: bool,
}

/// Per-run counts, aggregated for the end-of-run summary and for tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportStats {
    pub exported: usize,
    pub no_messages: usize,
    pub empty_content: usize,
    pub unanswered: usize,
    pub errors: usize,
}

impl ExportStats {
    pub fn filtered(&self) -> usize {
        self.no_messages + self.empty_content + self.unanswered
    }

    fn record_drop(&mut self, reason: FilterReason) {
        match reason {
            FilterReason::NoMessages => self.no_messages += 1,
            FilterReason::EmptyContent => self.empty_content += 1,
            FilterReason::HumanOnlyNoReply => self.unanswered += 1,
            FilterReason::Meaningful => {}
        }
    }
}

/// The main entry point for the export logic.
pub fn run_export(config: &ExportConfig) -> Result<ExportStats> {
    let conversations = archive::load_archive(&config.archive_path)?;

    fs::create_dir_all(&config.target_dir).wrap_err_with(|| {
        format!(
            "Failed to create target directory: {}",
            config.target_dir.display()
        )
    })?;

    let pb = if config.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(conversations.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
            )
            .unwrap()
            .progress_chars("=>-"),
        );
        bar.println(format!("Found {} conversations.", conversations.len()));
        bar
    };

    let mut taken: HashSet<String> = HashSet::new();
    let mut stats = ExportStats::default();

    for conversation in &conversations {
        match export_conversation(conversation, config, &mut taken) {
            Ok(Exported::Note(filename)) => {
                stats.exported += 1;
                if config.verbose {
                    pb.println(format!("Exported:  {}", filename));
                }
            }
            Ok(Exported::Dropped(reason)) => {
                stats.record_drop(reason);
                if config.verbose {
                    pb.println(format!(
                        "Filtered ({}):  {}",
                        reason.describe(),
                        short_id(&conversation.uuid)
                    ));
                }
            }
            Err(e) => {
                stats.errors += 1;
                pb.println(format!("Error [{}]: {:#}", short_id(&conversation.uuid), e));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    if !config.quiet {
        let mut summary = format!(
            "Done. {} exported, {} filtered ({} no messages, {} empty, {} unanswered).",
            stats.exported,
            stats.filtered(),
            stats.no_messages,
            stats.empty_content,
            stats.unanswered
        );
        if stats.errors > 0 {
            summary.push_str(&format!(" Completed with {} error(s).", stats.errors));
        }
        eprintln!("{}", summary);
    }

    Ok(stats)
}

fn short_id(id: &str) -> &str {
    &id[..8.min(id.len())]
}

enum Exported {
    Note(String),
    Dropped(FilterReason),
}

/// Filter, render, name, and write one conversation. `Err` means this
/// conversation failed (unparseable creation date, unwritable file) and the
/// run continues with the next one.
fn export_conversation(
    conversation: &Conversation,
    config: &ExportConfig,
    taken: &mut HashSet<String>,
) -> Result<Exported> {
    let decision = filter::evaluate(conversation);
    if !decision.keep {
        return Ok(Exported::Dropped(decision.reason));
    }

    let base = naming::derive_filename(&conversation.name, &conversation.created_at)?;
    let filename = allocate_filename(base, taken);

    let body = renderer::render(conversation, config.tags.as_deref());

    let path = config.target_dir.join(&filename);
    fs::write(&path, body).wrap_err_with(|| format!("Failed to write: {}", path.display()))?;

    Ok(Exported::Note(filename))
}

// Claim a unique filename for this run. The deriver is deterministic, so two
// same-day conversations with the same sanitized title collide; the second
// gets a numeric suffix before the extension.
fn allocate_filename(base: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.clone()) {
        return base;
    }
    let stem = base.strip_suffix(".md").unwrap_or(&base).to_string();
    let mut n = 2usize;
    loop {
        let candidate = format!("{}_{}.md", stem, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
