//! Generator request/response types and the plugin trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IntentError, Result};
use crate::project::{Project, Stack};

/// Input handed to a generator.
///
/// Every field is an opaque, already-encoded document; generators decide
/// how to read them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorRequest {
    /// Encoded project.
    #[serde(default)]
    pub project: Vec<u8>,
    /// Encoded stack.
    #[serde(default)]
    pub stack: Vec<u8>,
    /// Application name.
    #[serde(default)]
    pub app: Vec<u8>,
    /// Encoded workload configuration.
    #[serde(default)]
    pub workload: Vec<u8>,
    /// Module configuration written by the application developer.
    #[serde(default)]
    pub dev_module_config: Vec<u8>,
    /// Module configuration set by the platform team.
    #[serde(default)]
    pub platform_module_config: Vec<u8>,
    /// Runtime configuration.
    #[serde(default)]
    pub runtime_config: Vec<u8>,
}

impl GeneratorRequest {
    /// Creates a request for one application, encoding project and stack as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if project or stack cannot be encoded.
    pub fn for_app(project: &Project, stack: &Stack, app: &str) -> Result<Self> {
        Ok(Self {
            project: encode("project", project)?,
            stack: encode("stack", stack)?,
            app: app.as_bytes().to_vec(),
            ..Self::default()
        })
    }

    /// Sets the encoded workload configuration.
    #[must_use]
    pub fn with_workload(mut self, workload: impl Into<Vec<u8>>) -> Self {
        self.workload = workload.into();
        self
    }

    /// Sets the developer and platform module configurations.
    #[must_use]
    pub fn with_module_configs(
        mut self,
        dev: impl Into<Vec<u8>>,
        platform: impl Into<Vec<u8>>,
    ) -> Self {
        self.dev_module_config = dev.into();
        self.platform_module_config = platform.into();
        self
    }
}

fn encode<T: Serialize>(what: &'static str, value: &T) -> Result<Vec<u8>> {
    serde_yaml::to_string(value)
        .map(String::into_bytes)
        .map_err(|e| {
            IntentError::ParseError {
                message: format!("Failed to encode {what}: {e}"),
                location: None,
            }
            .into()
        })
}

/// Output of a generator: encoded resources and patchers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorResponse {
    /// JSON-encoded resources.
    #[serde(default)]
    pub resources: Vec<Vec<u8>>,
    /// JSON-encoded patchers.
    #[serde(default)]
    pub patchers: Vec<Vec<u8>>,
}

/// A change a generator wants applied to a resource produced elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patcher {
    /// Key of the resource to patch.
    pub target: String,
    /// JSON merge patch applied to the target's attributes.
    pub patch: Value,
}

/// A resource generator plugin.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generates resources and patchers for a request.
    async fn generate(&self, request: &GeneratorRequest) -> Result<GeneratorResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_for_app() {
        let request =
            GeneratorRequest::for_app(&Project::new("shop"), &Stack::new("dev"), "web").unwrap();

        assert_eq!(request.app, b"web");
        assert_eq!(String::from_utf8(request.project).unwrap(), "name: shop\n");
        assert!(request.workload.is_empty());
    }

    #[test]
    fn test_patcher_from_json() {
        let patcher: Patcher =
            serde_json::from_str(r#"{"target":"svc","patch":{"spec":{"replicas":2}}}"#).unwrap();
        assert_eq!(patcher.target, "svc");
        assert_eq!(patcher.patch["spec"]["replicas"], 2);
    }
}
