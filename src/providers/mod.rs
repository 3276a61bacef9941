//! Provider registry.
//!
//! Providers (for example secret stores) register a factory under the name
//! their spec uses as its single top-level key.

mod registry;

pub use registry::{ProviderRegistry, provider_name};
