use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "docloop",
    about = "Track generated documents and feed customer edits back into configuration",
    version
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress human-readable output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Override the data directory (default: $DOCLOOP_HOME or ./.docloop)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize the data directory with a default config
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Record the current content of a document as its new baseline
    Track {
        /// Document to track
        file: PathBuf,

        /// Metadata entry (repeatable)
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,
    },

    /// List the tracked versions of a document
    Versions {
        file: PathBuf,
    },

    /// Compare an edited document with its latest baseline and write a report
    Diff {
        /// Edited document (must already be tracked)
        file: PathBuf,

        /// Directory for the Markdown report (default: <data-dir>/reports)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Feedback session commands
    Session {
        #[command(subcommand)]
        cmd: SessionCommand,
    },
}

#[derive(Subcommand, Clone)]
pub enum SessionCommand {
    /// Track a document and open a feedback session for it
    Start {
        document: PathBuf,

        /// Program type the document was generated for
        #[arg(long)]
        program: String,

        /// Customer the document was generated for
        #[arg(long)]
        customer: String,
    },

    /// Analyze an edited copy within a session
    Process {
        id: String,

        /// Edited copy of the session's document
        edited: PathBuf,

        /// Apply confident suggestions to the configuration stores
        #[arg(long)]
        apply: bool,

        /// Regenerate the document when something was applied
        #[arg(long, requires = "apply")]
        regenerate: bool,
    },

    /// Complete a session and merge its branch
    Complete {
        id: String,
    },

    /// Abandon a session without merging
    Abandon {
        id: String,

        #[arg(long)]
        reason: Option<String>,
    },

    /// List sessions, most recently updated first
    List {
        /// Filter by status (active, completed, abandoned)
        #[arg(long)]
        status: Option<String>,

        /// Filter by document
        #[arg(long)]
        document: Option<PathBuf>,
    },

    /// Show a session and its iterations
    Show {
        id: String,
    },
}
