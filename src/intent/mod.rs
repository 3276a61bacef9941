//! Intent module: the declarative description of desired resources.
//!
//! This module handles everything that happens before a graph exists:
//! - Intent and resource types mapping to intent documents
//! - Loading intent documents from YAML or JSON files
//! - Building the key-unique resource index
//! - Discovering implicit references inside attribute trees

mod types;
mod loader;
mod index;
mod references;

pub use types::{Intent, Resource};
pub use loader::{IntentLoader, find_intent_file};
pub use index::ResourceIndex;
pub use references::{
    REFERENCE_PREFIX, dependency_keys, implicit_references, parse_reference, resolve_reference,
};
