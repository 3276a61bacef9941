//! CLI module for the Planwright planning tool.
//!
//! This module provides the command-line interface for validating intents,
//! inspecting their dependency graph and rendering change sets.

mod commands;
mod output;

pub use commands::{ActionFilter, Cli, Commands, OutputFormat, failure_policy};
pub use output::OutputFormatter;
