// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![warn(missing_docs)]                // All public items must be documented
#![warn(dead_code)]                   // Unused code is reported
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![warn(unused_imports)]              // Unused imports are reported
#![warn(unused_variables)]            // Unused variables are reported
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Planwright
//!
//! The planning core of a declarative infrastructure-as-code engine.
//!
//! ## Overview
//!
//! Planwright takes an *intent*, the full desired state of every managed
//! resource, and turns it into something an execution engine can apply:
//!
//! - Build a dependency graph between resources from explicit `dependsOn`
//!   lists and `$ref.<key>` references inside attribute trees
//! - Reject duplicate keys, dangling references and dependency cycles
//! - Reduce the graph to its essential edges and walk it in dependency order
//! - Model the resulting change set and render it as a colored diff
//!
//! ## Architecture
//!
//! 1. **Intent**: loaded from YAML/JSON or assembled from generator output
//! 2. **Graph**: a DAG hanging off one synthetic root, built by [`IntentParser`]
//! 3. **Changes**: ordered per-resource deltas with filtering and diffs
//!
//! ## Modules
//!
//! - [`intent`]: Intent types, loading and the resource index
//! - [`graph`]: DAG engine, intent parser and parallel walker
//! - [`planner`]: Change steps, change orders and diff rendering
//! - [`module`]: Generator plugin boundary
//! - [`providers`]: Provider registry
//! - [`project`]: Project and stack context
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! resources:
//!   - id: v1:Namespace:shop
//!     type: Kubernetes
//!     attributes:
//!       kind: Namespace
//!   - id: apps/v1:Deployment:shop:web
//!     type: Kubernetes
//!     attributes:
//!       metadata:
//!         namespace: $ref.v1:Namespace:shop.metadata.name
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod error;
pub mod graph;
pub mod intent;
pub mod module;
pub mod planner;
pub mod project;
pub mod providers;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use error::{PlanwrightError, Result, Status, StatusKind};
pub use graph::{FailurePolicy, IntentParser, ResourceGraph, WalkConfig, WalkReport, Walker};
pub use intent::{Intent, IntentLoader, Resource, ResourceIndex};
pub use module::{Generator, GeneratorRequest, GeneratorResponse, IntentAssembler};
pub use planner::{ActionType, ChangeOrder, ChangeStep, Changes};
pub use project::{Project, Stack};
pub use providers::ProviderRegistry;
