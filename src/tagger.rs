//! Semantic tagging pass over exported notes.
//!
//! A second, separate stage: for each note the external collaborator
//! receives the note body and returns the annotated document — the body
//! with `[[tag]]` lines appended. The collaborator is untrusted: before
//! anything reaches disk the returned document must reproduce the original
//! body byte-for-byte as a prefix, the trailer may contain nothing but tag
//! lines, and each tag must pass the format rules. Valid new tags are then
//! re-appended by this module into a staging file that is atomically
//! renamed over the note, so a violated invariant leaves the note exactly
//! as it was.

use eyre::{Context, Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

/// Prompt handed to the default `claude` command.
const TAG_PROMPT: &str = "Analyze the conversation note provided on stdin and choose 2-5 \
relevant one-word tags describing its topic, technology, or type of discussion. Tags must \
be single lowercase words (letters, digits, hyphens only), e.g. python, debugging, react, \
tutorial, planning. Print the note back completely unchanged, then append each tag at the \
end on its own line wrapped as [[tag]]. Keep any [[tag]] lines that already exist.";

/// External capability that annotates a note body with tag lines.
pub trait TagSuggester {
    /// Return the annotated document: the body, unaltered, with tag lines
    /// appended. Errors are per-note and never abort the batch.
    fn annotate(&self, body: &str) -> Result<String>;
}

/// Runs an external command, piping the note body to stdin and reading the
/// annotated document from stdout.
pub struct CommandTagSuggester {
    program: String,
    args: Vec<String>,
}

impl CommandTagSuggester {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        CommandTagSuggester {
            program: program.into(),
            args,
        }
    }

    /// The stock collaborator: `claude -p <prompt>`.
    pub fn claude_default() -> Self {
        Self::new("claude", vec!["-p".to_string(), TAG_PROMPT.to_string()])
    }

    /// Build from a user-supplied command line, split on whitespace.
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| eyre!("Empty tagging command"))?;
        Ok(Self::new(program, parts.collect()))
    }
}

impl TagSuggester for CommandTagSuggester {
    fn annotate(&self, body: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .wrap_err_with(|| format!("Failed to spawn tagging command: {}", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| eyre!("Tagging command has no stdin"))?;
        // Feed stdin from a separate thread so a note larger than the pipe
        // buffer cannot deadlock against the command's own output.
        let body = body.to_string();
        let feeder = std::thread::spawn(move || stdin.write_all(body.as_bytes()));

        let output = child
            .wait_with_output()
            .wrap_err("Failed to wait for tagging command")?;
        let fed = feeder
            .join()
            .map_err(|_| eyre!("Stdin feeder thread panicked"))?;
        if !output.status.success() {
            return Err(eyre!(
                "Tagging command failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        // A command that stops reading early (broken pipe) but still exits
        // cleanly produced a full document; any other write failure is real.
        if let Err(e) = fed
            && e.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(e).wrap_err("Failed to write note body to tagging command");
        }
        String::from_utf8(output.stdout).wrap_err("Tagging command produced invalid UTF-8")
    }
}

/// Outcome of one note's tagging round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    /// New tags committed (count of lines appended).
    Tagged(usize),
    /// Note already carries tags; skipped without invoking the collaborator.
    AlreadyTagged,
    /// Collaborator returned no usable new tags; note untouched.
    NoNewTags,
    /// Integrity violation: the annotated document did not preserve the
    /// body, or its trailer held something other than tag lines. Note
    /// untouched.
    Rejected,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TagStats {
    pub tagged: usize,
    pub already_tagged: usize,
    pub no_new_tags: usize,
    pub rejected: usize,
    pub errors: usize,
}

pub struct TagOptions {
    pub target_dir: PathBuf,
    pub force: bool,
    pub limit: Option<usize>,
    pub verbose: bool,
    pub quiet: bool,
}

/// Parse a `[[tag]]` line; the inner text must be bracket-free.
fn parse_tag_line(line: &str) -> Option<&str> {
    let inner = line.strip_prefix("[[")?.strip_suffix("]]")?;
    if inner.is_empty() || inner.contains('[') || inner.contains(']') {
        return None;
    }
    Some(inner)
}

/// All tags already present in a document, in order of appearance.
pub fn existing_tags(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| parse_tag_line(line.trim()))
        .map(str::to_string)
        .collect()
}

/// Lowercase, no whitespace, `[a-z0-9-]` only.
fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Run one note through the collaborator and commit or reject the result.
pub fn tag_note(path: &Path, suggester: &dyn TagSuggester, force: bool) -> Result<TagOutcome> {
    let original = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read note: {}", path.display()))?;

    let present = existing_tags(&original);
    if !force && !present.is_empty() {
        return Ok(TagOutcome::AlreadyTagged);
    }

    let annotated = suggester.annotate(&original)?;

    // Invariant: everything before the tag trailer is byte-identical.
    let Some(trailer) = annotated.strip_prefix(original.as_str()) else {
        return Ok(TagOutcome::Rejected);
    };

    let mut suggested = Vec::new();
    for line in trailer.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_tag_line(line) {
            Some(tag) => suggested.push(tag.to_string()),
            None => return Ok(TagOutcome::Rejected),
        }
    }

    let mut seen: Vec<&str> = present.iter().map(String::as_str).collect();
    let mut fresh: Vec<String> = Vec::new();
    for tag in &suggested {
        if is_valid_tag(tag) && !seen.contains(&tag.as_str()) {
            seen.push(tag.as_str());
            fresh.push(tag.clone());
        }
    }
    if fresh.is_empty() {
        return Ok(TagOutcome::NoNewTags);
    }

    let mut updated = original.clone();
    if !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push('\n');
    for tag in &fresh {
        updated.push_str(&format!("[[{}]]\n", tag));
    }

    // Stage next to the note and rename over it; a failure anywhere before
    // persist leaves the note untouched.
    let dir = path.parent().ok_or_else(|| eyre!("Note has no parent dir"))?;
    let mut staging = NamedTempFile::new_in(dir).wrap_err("Failed to create staging file")?;
    staging
        .write_all(updated.as_bytes())
        .wrap_err("Failed to write staging file")?;
    staging
        .persist(path)
        .wrap_err_with(|| format!("Failed to replace note: {}", path.display()))?;

    Ok(TagOutcome::Tagged(fresh.len()))
}

/// All `.md` notes in the target directory, sorted by name for a
/// deterministic pass order.
fn list_notes(target_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(target_dir)
        .wrap_err_with(|| format!("Target directory not found: {}", target_dir.display()))?;
    let mut notes: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    notes.sort();
    Ok(notes)
}

/// Batch driver: tag every note in the directory, isolating per-note
/// failures. Only a missing/unreadable directory is fatal.
pub fn run_tag(options: &TagOptions, suggester: &dyn TagSuggester) -> Result<TagStats> {
    let mut notes = list_notes(&options.target_dir)?;
    if let Some(limit) = options.limit {
        notes.truncate(limit);
    }

    let pb = if options.quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(notes.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
            )
            .unwrap()
            .progress_chars("=>-"),
        );
        bar.println(format!("Found {} notes.", notes.len()));
        bar
    };

    let mut stats = TagStats::default();
    for path in &notes {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match tag_note(path, suggester, options.force) {
            Ok(TagOutcome::Tagged(n)) => {
                stats.tagged += 1;
                if options.verbose {
                    pb.println(format!("Tagged ({}):  {}", n, name));
                }
            }
            Ok(TagOutcome::AlreadyTagged) => {
                stats.already_tagged += 1;
                if options.verbose {
                    pb.println(format!("Skipped (tagged):  {}", name));
                }
            }
            Ok(TagOutcome::NoNewTags) => {
                stats.no_new_tags += 1;
                if options.verbose {
                    pb.println(format!("No tags:  {}", name));
                }
            }
            Ok(TagOutcome::Rejected) => {
                stats.rejected += 1;
                pb.println(format!("Rejected (content altered):  {}", name));
            }
            Err(e) => {
                stats.errors += 1;
                pb.println(format!("Error [{}]: {:#}", name, e));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    if !options.quiet {
        let mut summary = format!(
            "Done. {} tagged, {} already tagged, {} without new tags.",
            stats.tagged, stats.already_tagged, stats.no_new_tags
        );
        if stats.rejected > 0 {
            summary.push_str(&format!(" {} rejected.", stats.rejected));
        }
        if stats.errors > 0 {
            summary.push_str(&format!(" Completed with {} error(s).", stats.errors));
        }
        eprintln!("{}", summary);
    }

    Ok(stats)
}
