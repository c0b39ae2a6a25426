//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `spec` - Show the configuration specification
//! - `check` - Test connection to the API
//! - `discover` - Print the stream catalog
//! - `read` - Extract data from streams

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, ENV_CONFIG};
pub use runner::Runner;
