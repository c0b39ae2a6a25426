//! CLI commands and argument parsing

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Config source naming the environment instead of a file
pub const ENV_CONFIG: &str = "ENV";

/// Pinterest Ads extraction tap
#[derive(Parser, Debug)]
#[command(name = "tap-pinterest-ads")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON); repeat to merge, later files win.
    /// `ENV` reads TAP_PINTEREST_ADS_* variables instead
    #[arg(short = 'C', long, global = true)]
    pub config: Vec<PathBuf>,

    /// State file (JSON), read at startup and rewritten after every bookmark
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Output format for spec, check and discover
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the tap's configuration specification
    Spec,

    /// Test connection to the API
    Check,

    /// Print the stream catalog with schemas
    Discover,

    /// Read data from streams
    Read {
        /// Streams to sync (comma-separated, empty = all)
        #[arg(long, value_delimiter = ',')]
        streams: Vec<String>,

        /// Run as if today were this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

impl Cli {
    /// Whether config comes from the environment
    pub fn config_from_env(&self) -> bool {
        self.config.is_empty() || (self.config.len() == 1 && self.config[0] == PathBuf::from(ENV_CONFIG))
    }
}
