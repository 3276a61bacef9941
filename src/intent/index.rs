//! Key-unique resource index.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{IntentError, Result};

use super::types::{Intent, Resource};

/// Immutable key→resource mapping built once from an intent.
///
/// Iteration follows key order so graph construction does not depend on
/// the order resources were declared in.
#[derive(Debug, Clone, Default)]
pub struct ResourceIndex {
    resources: BTreeMap<String, Resource>,
}

impl ResourceIndex {
    /// Builds the index from an intent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty key and `DuplicateKey` when two
    /// resources share a key.
    pub fn build(intent: &Intent) -> Result<Self> {
        let mut resources = BTreeMap::new();

        for resource in &intent.resources {
            if resource.id.trim().is_empty() {
                return Err(IntentError::invalid_argument(format!(
                    "resource of type '{}' has an empty key",
                    resource.resource_type
                ))
                .into());
            }
            if resources.contains_key(&resource.id) {
                return Err(IntentError::DuplicateKey {
                    key: resource.id.clone(),
                }
                .into());
            }
            resources.insert(resource.id.clone(), resource.clone());
        }

        debug!("Indexed {} resources", resources.len());
        Ok(Self { resources })
    }

    /// Returns the resource for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Resource> {
        self.resources.get(key)
    }

    /// Returns true if the key is indexed.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.resources.contains_key(key)
    }

    /// Iterates over `(key, resource)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Resource)> {
        self.resources.iter()
    }

    /// Returns the number of indexed resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
