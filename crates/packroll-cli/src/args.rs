use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "packroll")]
#[command(about = "Version rollover tool for change-control document packages")]
#[command(version)]
pub struct Cli {
    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base directory (default: ~/.packroll)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ExtractTarget {
    /// Migration-record forms
    A2,
    /// Application forms
    A5,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Roll the source tree over into the next package version
    Rollover {
        /// Source tree, the current version (default: paths.source)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Target tree for the next version (default: paths.target)
        #[arg(short, long)]
        target: Option<PathBuf>,
    },

    /// Write migration dates into every migration form of a tree
    SetDates {
        /// Target tree (default: paths.target)
        #[arg(short, long)]
        target: Option<PathBuf>,

        /// Validation-environment migration date (e.g., 2026.03.01)
        #[arg(long)]
        validation_date: String,

        /// Production-environment migration date (default: same as validation)
        #[arg(long, default_value = "")]
        production_date: String,
    },

    /// Export form contents of a tree to CSV
    Extract {
        /// Which forms to read
        #[arg(value_enum)]
        kind: ExtractTarget,

        /// Target tree (default: paths.target)
        #[arg(short, long)]
        target: Option<PathBuf>,

        /// Directory the CSV files are written to
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Print an indented listing of a tree
    Tree {
        /// Root of the tree (default: paths.target)
        path: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., paths.source)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., paths.source)
        key: String,

        /// Value to set (lists: "Product,Stage" or "[Product, Stage]")
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Initialize config file with defaults
    Init,
}
