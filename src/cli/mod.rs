//! CLI module for toolhop - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for the tool service,
//! the HTTP gateway, and catalog inspection.

pub mod commands;

pub use commands::{Cli, Commands};
