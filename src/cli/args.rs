//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

use crate::domain::SortOrder;

/// Clean, dedupe and group the labels of a scraped org chart
#[derive(Parser, Debug)]
#[command(name = "orgtidy")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Directory searched for .orgtidy.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean an org chart JSON file
    Process {
        /// Raw org chart JSON (default: configured input)
        #[arg(value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        /// Write the result to a file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Sibling order of the tree view (default: configured)
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        /// Show only labels containing this text (tree view)
        #[arg(short, long)]
        search: Option<String>,
        /// Override pipeline.min_group_size
        #[arg(long)]
        min_group_size: Option<usize>,
    },

    /// Clean single labels
    Clean {
        /// Raw labels
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Check whether two labels would be merged
    Similar {
        a: String,
        b: String,
    },

    /// Show before/after statistics
    Stats {
        /// Raw org chart JSON (default: configured input)
        #[arg(value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format of `process`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Indented tree
    Tree,
}

/// Sibling order of the tree view.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortArg {
    Insertion,
    Name,
    Size,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Insertion => SortOrder::Insertion,
            SortArg::Name => SortOrder::Name,
            SortArg::Size => SortOrder::Size,
        }
    }
}
