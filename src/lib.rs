//! Toolhop - a chat assistant backend built around a typed tool catalog
//!
//! The tool service executes builtin tools behind a line-delimited JSON
//! protocol; the gateway turns one user message into at most one tool hop
//! plus a synthesized answer.

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod llm;
pub mod tools;
pub mod transport;

pub use error::{Result, ToolhopError};
