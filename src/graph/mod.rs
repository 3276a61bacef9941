//! Dependency graph module.
//!
//! This module turns an intent into a validated, transitively reduced DAG
//! and walks that DAG respecting dependency order:
//! - [`ResourceGraph`]: keyed DAG engine with a single synthetic root
//! - [`IntentParser`]: populates a graph from an intent
//! - [`Walker`]: ordered, parallel traversal with an explicit failure policy

mod node;
mod dag;
mod parser;
mod walk;

pub use node::{ResourceNode, Vertex, ROOT_KEY};
pub use dag::ResourceGraph;
pub use parser::IntentParser;
pub use walk::{FailurePolicy, VisitOutcome, WalkConfig, WalkReport, Walker};
