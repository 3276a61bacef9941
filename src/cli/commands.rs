//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::graph::{FailurePolicy, WalkConfig};
use crate::planner::ActionType;

/// Planwright - dependency planning for declarative infrastructure.
#[derive(Parser, Debug)]
#[command(name = "planwright")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the intent file (searched upwards from the current directory if omitted).
    #[arg(short, long, global = true, env = "PLANWRIGHT_INTENT")]
    pub intent: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the resource graph and report whether the intent is valid.
    Validate,

    /// Show the reduced resource graph.
    Graph {
        /// Also show execution waves.
        #[arg(short, long)]
        waves: bool,
    },

    /// Walk the graph in dependency order without applying anything.
    Walk {
        /// Maximum number of resources visited at once.
        #[arg(short = 'j', long, env = "PLANWRIGHT_PARALLELISM", default_value_t = WalkConfig::DEFAULT_PARALLELISM)]
        parallelism: usize,

        /// Keep walking independent resources after a failure.
        #[arg(long)]
        continue_on_error: bool,

        /// Stop starting new visits after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Render the diffs of a change document.
    Diff {
        /// Path to the change document (YAML or JSON).
        #[arg(short, long, env = "PLANWRIGHT_CHANGES")]
        changes: PathBuf,

        /// Only show steps with this action.
        #[arg(short, long)]
        action: Option<ActionFilter>,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Action selector for the `diff` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ActionFilter {
    /// Steps creating a resource.
    Create,
    /// Steps updating a resource.
    Update,
    /// Steps deleting a resource.
    Delete,
    /// Steps leaving a resource as is.
    Unchanged,
}

impl From<ActionFilter> for ActionType {
    fn from(filter: ActionFilter) -> Self {
        match filter {
            ActionFilter::Create => Self::Create,
            ActionFilter::Update => Self::Update,
            ActionFilter::Delete => Self::Delete,
            ActionFilter::Unchanged => Self::UnChange,
        }
    }
}

/// Maps the `--continue-on-error` flag to a failure policy.
#[must_use]
pub const fn failure_policy(continue_on_error: bool) -> FailurePolicy {
    if continue_on_error {
        FailurePolicy::ContinueOnError
    } else {
        FailurePolicy::FailFast
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_walk() {
        let cli = Cli::try_parse_from([
            "planwright",
            "--intent",
            "intent.yaml",
            "walk",
            "-j",
            "8",
            "--continue-on-error",
        ])
        .unwrap();

        assert_eq!(cli.intent, Some(PathBuf::from("intent.yaml")));
        match cli.command {
            Commands::Walk {
                parallelism,
                continue_on_error,
                timeout,
            } => {
                assert_eq!(parallelism, 8);
                assert_eq!(failure_policy(continue_on_error), FailurePolicy::ContinueOnError);
                assert!(timeout.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_diff_filter() {
        let cli = Cli::try_parse_from([
            "planwright",
            "diff",
            "--changes",
            "changes.json",
            "--action",
            "unchanged",
            "--output",
            "json",
        ])
        .unwrap();

        assert!(matches!(cli.output, OutputFormat::Json));
        match cli.command {
            Commands::Diff { changes, action } => {
                assert_eq!(changes, PathBuf::from("changes.json"));
                assert_eq!(action.map(ActionType::from), Some(ActionType::UnChange));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
