use clap::{Parser, Subcommand};
use claude_chat_notes::process::{self, ExportConfig};
use claude_chat_notes::tagger::{self, CommandTagSuggester, TagOptions};
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Convert a Claude conversations.json export to Markdown notes,
/// and optionally tag them with an external command.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/claude-chat-notes/config.toml
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export conversations from the archive to Markdown note files.
    Export {
        /// Directory to write markdown notes.
        /// Defaults to ./conversations if not set in config.
        #[arg(value_name = "TARGET_DIR")]
        target_dir: Option<PathBuf>,

        /// Path to conversations.json (or the export directory containing it).
        /// Defaults to ./conversations.json.
        #[arg(long, value_name = "PATH")]
        archive: Option<PathBuf>,

        /// Comma-separated tags appended to every note (e.g. "claude,llm").
        #[arg(long, value_name = "TAGS", value_delimiter = ',')]
        tags: Option<Vec<String>>,

        /// Print each file written or filtered.
        #[arg(short, long)]
        verbose: bool,

        /// Suppress standard output (progress bars).
        #[arg(short, long)]
        quiet: bool,
    },

    /// Suggest and append semantic tags to exported notes.
    Tag {
        /// Directory holding the exported notes.
        /// Defaults to ./conversations if not set in config.
        #[arg(value_name = "TARGET_DIR")]
        target_dir: Option<PathBuf>,

        /// Retag notes that already carry tags.
        #[arg(short, long)]
        force: bool,

        /// Process at most N notes.
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Tagging command: receives the note on stdin, prints the
        /// annotated note on stdout. Defaults to the claude CLI.
        #[arg(long, value_name = "CMD")]
        command: Option<String>,

        /// Print the outcome for each note.
        #[arg(short, long)]
        verbose: bool,

        /// Suppress standard output (progress bars).
        #[arg(short, long)]
        quiet: bool,
    },
}

#[derive(Deserialize, Default)]
struct FileConfig {
    target_dir: Option<PathBuf>,
    archive_path: Option<PathBuf>,
    tags: Option<Vec<String>>,
    tag_command: Option<String>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        // Search: XDG/OS config dir, then nothing
        dirs::config_dir()
            .map(|d| d.join("claude-chat-notes/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

/// Accept either the conversations.json file itself or the export directory
/// that contains it.
fn resolve_archive_path(path: PathBuf) -> Result<PathBuf> {
    let path = if path.is_dir() {
        path.join("conversations.json")
    } else {
        path
    };
    if !path.exists() {
        return Err(eyre!(
            "Archive not found at: {}\nUse --archive to point at conversations.json.",
            path.display()
        ));
    }
    Ok(path)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Export {
            target_dir,
            archive,
            tags,
            verbose,
            quiet,
        } => {
            // 2. Resolve target_dir (CLI > Config > Default)
            let target_dir = target_dir
                .or(file_cfg.target_dir)
                .unwrap_or_else(|| PathBuf::from("conversations"));

            // 3. Resolve archive path (CLI > Config > Default)
            let archive_path = resolve_archive_path(
                archive
                    .or(file_cfg.archive_path)
                    .unwrap_or_else(|| PathBuf::from("conversations.json")),
            )?;

            // 4. Resolve tags (CLI > Config)
            let tags = tags.or(file_cfg.tags);

            let config = ExportConfig {
                archive_path,
                target_dir,
                tags,
                verbose,
                quiet,
            };
            process::run_export(&config)?;
            Ok(())
        }

        Commands::Tag {
            target_dir,
            force,
            limit,
            command,
            verbose,
            quiet,
        } => {
            let target_dir = target_dir
                .or(file_cfg.target_dir)
                .unwrap_or_else(|| PathBuf::from("conversations"));

            let suggester = match command.or(file_cfg.tag_command) {
                Some(cmd) => CommandTagSuggester::from_command_line(&cmd)?,
                None => CommandTagSuggester::claude_default(),
            };

            let options = TagOptions {
                target_dir,
                force,
                limit,
                verbose,
                quiet,
            };
            tagger::run_tag(&options, &suggester)?;
            Ok(())
        }
    }
}
