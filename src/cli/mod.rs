//! CLI module for the channel registry
//!
//! Provides command-line interface for:
//! - serve: Start the HTTP API
//! - seed: Install the default catalog
//! - schema: Print the resolved schema of a type
//! - validate: Dry-run validation of a record from stdin

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run, run_command, schema, seed, serve, validate, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
