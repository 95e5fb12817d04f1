//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - serve-tools: run the tool service
//! - gateway: run the HTTP gateway
//! - tools: print the catalog of a running tool service

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Toolhop - a chat assistant backend with a typed tool catalog
#[derive(Parser, Debug)]
#[command(name = "toolhop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the tool service (the process that executes tools)
    ServeTools {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the HTTP gateway (chat endpoint backed by the tool service)
    Gateway {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the tool catalog of a running tool service
    Tools {
        /// Tool service host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Tool service port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}
