//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Chronicle - versioned narrative generation for generated worlds
#[derive(Parser, Debug)]
#[command(name = "chronicle")]
#[command(about = "Versioned narrative generation for generated worlds", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file layered over the bundled defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding records and the cost ledger (overrides configuration)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a pending chronicle from a generation context file
    Submit {
        /// JSON file holding the chronicle context
        context: PathBuf,

        /// JSON file holding the temporal context
        #[arg(long)]
        temporal: Option<PathBuf>,

        /// Chronicle id (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Run the initial generation right away
        #[arg(long)]
        generate: bool,
    },

    /// Run one pipeline step
    Run {
        /// Step name (e.g. generate_v2, compare, title)
        step: String,

        /// Chronicle id
        #[arg(long)]
        id: Option<String>,

        /// Targeted version
        #[arg(long)]
        version: Option<String>,

        /// Sampling mode for regenerate_temperature (normal or low)
        #[arg(long)]
        sampling: Option<String>,

        /// Targeted image placement for regenerate_scene_description
        #[arg(long)]
        image_ref: Option<String>,

        /// JSON file holding a chronicle context for generate_v2
        #[arg(long)]
        context: Option<PathBuf>,
    },

    /// Show a chronicle record
    Show {
        /// Chronicle id
        id: String,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// List chronicles, newest first
    List {
        /// Status filter (e.g. editing, complete)
        #[arg(long)]
        status: Option<String>,

        /// Maximum number of chronicles to display
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Number of chronicles to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// List the versions of a chronicle
    Versions {
        /// Chronicle id
        id: String,
    },

    /// Accept the active version as final
    Accept {
        /// Chronicle id
        id: String,
    },

    /// Return an accepted chronicle to draft
    Unpublish {
        /// Chronicle id
        id: String,
    },

    /// Discard a chronicle's content and recreate its pending shell
    Restart {
        /// Chronicle id
        id: String,
    },

    /// Make a version active
    Activate {
        /// Chronicle id
        id: String,

        /// Version id
        version: String,
    },

    /// Delete one version
    DeleteVersion {
        /// Chronicle id
        id: String,

        /// Version id
        version: String,
    },

    /// Print the resolved configuration
    Config,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
