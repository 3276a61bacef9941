//! Generator plugin boundary.
//!
//! Generators turn application configuration into resources. This module
//! models the request/response exchanged with them and assembles their
//! output into an [`Intent`](crate::intent::Intent):
//! - [`GeneratorRequest`] / [`GeneratorResponse`]: the wire types
//! - [`Generator`]: the async plugin trait
//! - [`IntentAssembler`]: decodes resources and applies patchers

mod types;
mod assembler;

pub use types::{Generator, GeneratorRequest, GeneratorResponse, Patcher};
pub use assembler::{IntentAssembler, generate_intent, merge_patch};

#[cfg(test)]
pub use types::MockGenerator;
