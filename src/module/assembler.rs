//! Assembles generator output into an intent.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{IntentError, Result};
use crate::intent::{Intent, Resource};

use super::types::{Generator, GeneratorRequest, GeneratorResponse, Patcher};

/// Collects resources and patchers from generator responses.
///
/// Patchers are applied only in [`finish`](Self::finish), so a patcher may
/// target a resource produced by any generator.
#[derive(Debug, Default)]
pub struct IntentAssembler {
    resources: Vec<Resource>,
    patchers: Vec<Patcher>,
}

impl IntentAssembler {
    /// Creates an empty assembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a response and keeps its resources and patchers.
    ///
    /// # Errors
    ///
    /// Returns a decode error naming the first blob that is not valid JSON
    /// for its kind.
    pub fn add_response(&mut self, response: &GeneratorResponse) -> Result<()> {
        for (index, blob) in response.resources.iter().enumerate() {
            self.resources.push(decode("resource", index, blob)?);
        }
        for (index, blob) in response.patchers.iter().enumerate() {
            self.patchers.push(decode("patcher", index, blob)?);
        }
        debug!(
            "Decoded {} resources and {} patchers",
            response.resources.len(),
            response.patchers.len()
        );
        Ok(())
    }

    /// Applies every patcher and returns the intent.
    ///
    /// # Errors
    ///
    /// Returns an unresolved reference error if a patcher targets a
    /// resource no generator produced.
    pub fn finish(mut self) -> Result<Intent> {
        for (index, patcher) in self.patchers.iter().enumerate() {
            let Some(resource) = self.resources.iter_mut().find(|r| r.id == patcher.target) else {
                return Err(IntentError::UnresolvedReference {
                    from: format!("patcher #{index}"),
                    key: patcher.target.clone(),
                }
                .into());
            };
            merge_patch(&mut resource.attributes, &patcher.patch);
        }
        Ok(Intent::new(self.resources))
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    kind: &'static str,
    index: usize,
    blob: &[u8],
) -> Result<T> {
    serde_json::from_slice(blob).map_err(|e| {
        IntentError::Decode {
            kind,
            index,
            message: e.to_string(),
        }
        .into()
    })
}

/// Applies a JSON merge patch: objects merge key by key, `null` removes a
/// key, anything else replaces the target.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

/// Runs every generator on the same request and assembles their output.
///
/// # Errors
///
/// Returns the first generator error, decode error or unresolved patcher
/// target.
pub async fn generate_intent(
    generators: &[Arc<dyn Generator>],
    request: &GeneratorRequest,
) -> Result<Intent> {
    let mut assembler = IntentAssembler::new();
    for (i, generator) in generators.iter().enumerate() {
        let response = generator.generate(request).await?;
        debug!("Generator #{i} returned {} resources", response.resources.len());
        assembler.add_response(&response)?;
    }
    let intent = assembler.finish()?;
    info!(
        "Assembled intent with {} resources from {} generators",
        intent.len(),
        generators.len()
    );
    Ok(intent)
}
