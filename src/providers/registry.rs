//! Thread-safe name→factory registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ProviderError, Result};

/// Registry of provider factories keyed by provider name.
///
/// Registration normally happens once at startup; lookups may come from any
/// thread afterwards.
#[derive(Debug)]
pub struct ProviderRegistry<F: ?Sized> {
    registry: RwLock<HashMap<String, Arc<F>>>,
}

impl<F: ?Sized> Default for ProviderRegistry<F> {
    fn default() -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
        }
    }
}

impl<F: ?Sized> ProviderRegistry<F> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under a name, replacing any previous one.
    pub fn register(&self, name: impl Into<String>, factory: Arc<F>) {
        let name = name.into();
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if registry.contains_key(&name) {
            warn!("Provider {name} was registered twice");
        }
        info!("Registered provider {name}");
        registry.insert(name, factory);
    }

    /// Registers a factory under the provider name its spec declares.
    ///
    /// # Errors
    ///
    /// Returns an error unless the spec is an object with exactly one key.
    pub fn register_spec(&self, factory: Arc<F>, spec: &Value) -> Result<()> {
        let name = provider_name(spec)?;
        self.register(name, factory);
        Ok(())
    }

    /// Returns the factory registered under a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<F>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Returns the factory for the provider a spec declares.
    ///
    /// A malformed spec finds nothing.
    #[must_use]
    pub fn get_by_spec(&self, spec: &Value) -> Option<Arc<F>> {
        provider_name(spec).ok().and_then(|name| self.get(&name))
    }

    /// Returns every registered name, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

/// Returns the provider named by a spec: its one top-level key.
///
/// # Errors
///
/// Returns an error if the spec is not an object or has zero or several keys.
pub fn provider_name(spec: &Value) -> Result<String> {
    match spec.as_object() {
        Some(map) if map.len() == 1 => map
            .keys()
            .next()
            .cloned()
            .ok_or_else(|| ProviderError::InvalidSpec { found: 0 }.into()),
        Some(map) => Err(ProviderError::InvalidSpec { found: map.len() }.into()),
        None => Err(ProviderError::InvalidSpec { found: 0 }.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    trait SecretStore: Send + Sync {
        fn kind(&self) -> &'static str;
    }

    struct Vault;
    struct Aws;

    impl SecretStore for Vault {
        fn kind(&self) -> &'static str {
            "vault"
        }
    }

    impl SecretStore for Aws {
        fn kind(&self) -> &'static str {
            "aws"
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry: ProviderRegistry<dyn SecretStore> = ProviderRegistry::new();
        registry
            .register_spec(Arc::new(Vault), &json!({ "vault": { "server": "https://vault" } }))
            .unwrap();
        registry.register("aws", Arc::new(Aws));

        assert_eq!(registry.get("vault").unwrap().kind(), "vault");
        assert_eq!(
            registry
                .get_by_spec(&json!({ "aws": { "region": "eu-west-1" } }))
                .unwrap()
                .kind(),
            "aws"
        );
        assert!(registry.get("azure").is_none());
        assert_eq!(registry.names(), vec!["aws", "vault"]);
    }

    #[test]
    fn test_duplicate_registration_replaces() {
        let registry: ProviderRegistry<dyn SecretStore> = ProviderRegistry::new();
        registry.register("store", Arc::new(Vault));
        registry.register("store", Arc::new(Aws));

        assert_eq!(registry.names().len(), 1);
        assert_eq!(registry.get("store").unwrap().kind(), "aws");
    }

    #[test]
    fn test_spec_must_name_one_provider() {
        assert_eq!(provider_name(&json!({ "vault": {} })).unwrap(), "vault");

        let err = provider_name(&json!({ "vault": {}, "aws": {} })).unwrap_err();
        assert!(err.to_string().contains("found 2"));
        assert!(provider_name(&json!({})).is_err());
        assert!(provider_name(&json!("vault")).is_err());

        let registry: ProviderRegistry<dyn SecretStore> = ProviderRegistry::new();
        assert!(registry.register_spec(Arc::new(Vault), &json!({})).is_err());
        assert!(registry.get_by_spec(&json!(null)).is_none());
    }

    #[test]
    fn test_shared_across_threads() {
        let registry: Arc<ProviderRegistry<dyn SecretStore>> = Arc::new(ProviderRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.register(format!("store-{i}"), Arc::new(Vault)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.names().len(), 4);
    }
}
