//! Clap derive structures for the `graphform` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// graphform -- build and check cloud topology documents
#[derive(Debug, Parser)]
#[command(
    name = "graphform",
    version,
    about = "Build and check cloud topology documents from the command line",
    long_about = "Edit a topology document (vpcs, subnets, security groups, keys, storage,\n\
        compute, ...) while every cross reference is kept consistent.\n\n\
        Each mutation runs one reconciliation pass: references to deleted or\n\
        renamed records are repaired before the document is written back.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Document file (overrides profile)
    #[arg(long, short = 'f', env = "GRAPHFORM_FILE", global = true)]
    pub file: Option<PathBuf>,

    /// Project profile to use
    #[arg(long, short = 'p', env = "GRAPHFORM_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GRAPHFORM_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a freshly seeded document
    Init {
        /// Overwrite an existing document
        #[arg(long)]
        force: bool,
    },

    /// Report dangling references and records that cannot be saved
    Check,

    /// Repair references and write the document back
    Reconcile {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// List registered collections in reconciliation order
    #[command(alias = "cols")]
    Collections,

    /// List records at a path (e.g. `vpcs`, `vpcs/management/subnets`)
    #[command(alias = "ls")]
    List {
        /// Store path
        path: String,
    },

    /// Show one record
    Show {
        /// Store path
        path: String,
        /// Record name (the collection name for singletons)
        name: String,
    },

    /// Add a record from a JSON object
    Create {
        /// Store path
        path: String,
        /// Record as JSON, e.g. '{"name":"edge","resource_group":"service-rg"}'
        json: String,
        /// Insert at this index instead of appending
        #[arg(long)]
        at: Option<usize>,
    },

    /// Delete a record and repair everything that referenced it
    #[command(alias = "rm")]
    Delete {
        /// Store path
        path: String,
        /// Record name
        name: String,
    },

    /// Rename a record; references follow or are cleared per type
    #[command(alias = "mv")]
    Rename {
        /// Store path
        path: String,
        /// Current name
        old: String,
        /// New name
        new: String,
    },

    /// Move a record to another position in its list
    Move {
        /// Store path
        path: String,
        /// Current index
        from: usize,
        /// Target index
        to: usize,
    },

    /// Set one field through a form session
    Set {
        /// Store path
        path: String,
        /// Record name (the collection name for singletons)
        name: String,
        /// Field name
        field: String,
        /// New value as JSON; bare words are taken as strings
        value: String,
    },

    /// Print the whole document
    Export,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
