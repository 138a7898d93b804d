//! CLI argument definitions using clap
//!
//! Commands:
//! - channel-registry serve --config <path> [--port <port>]
//! - channel-registry seed --config <path>
//! - channel-registry schema --config <path> --type <code>
//! - channel-registry validate --config <path> --type <code> [--update]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Channel registry: per-type attribute schemas for channel records
#[derive(Parser, Debug)]
#[command(name = "channel-registry")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./channel-registry.json")]
        config: PathBuf,

        /// Overrides the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Install the default channel types and attributes
    Seed {
        /// Path to configuration file
        #[arg(long, default_value = "./channel-registry.json")]
        config: PathBuf,
    },

    /// Print the resolved schema of a channel type
    Schema {
        /// Path to configuration file
        #[arg(long, default_value = "./channel-registry.json")]
        config: PathBuf,

        /// Channel type code
        #[arg(long = "type")]
        type_code: String,
    },

    /// Validate a record read from stdin against a channel type
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./channel-registry.json")]
        config: PathBuf,

        /// Channel type code
        #[arg(long = "type")]
        type_code: String,

        /// Validate as an edit of an existing record
        #[arg(long)]
        update: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_flags() {
        let cli = Cli::try_parse_from([
            "channel-registry",
            "validate",
            "--type",
            "discord",
            "--update",
        ])
        .unwrap();
        match cli.command {
            Command::Validate {
                config,
                type_code,
                update,
            } => {
                assert_eq!(config, PathBuf::from("./channel-registry.json"));
                assert_eq!(type_code, "discord");
                assert!(update);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_serve_port_is_optional() {
        let cli = Cli::try_parse_from(["channel-registry", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve { port: None, .. }));
    }
}
