//! Intent specification types.
//!
//! These structs map to intent documents (YAML or JSON). An intent is the
//! fully-resolved desired state: every managed resource with its attribute
//! tree and its explicit dependencies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The root structure of an intent document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Intent {
    /// Resources managed by this intent.
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// One managed infrastructure unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    /// Unique, stable key of the resource.
    pub id: String,
    /// Resource type (e.g. `Kubernetes`, `Terraform`).
    #[serde(rename = "type", default)]
    pub resource_type: String,
    /// Attribute tree describing the desired state.
    #[serde(default = "empty_attributes")]
    pub attributes: Value,
    /// Keys of resources that must be applied before this one.
    #[serde(rename = "dependsOn", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Free-form extension data.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

fn empty_attributes() -> Value {
    Value::Object(Map::new())
}

impl Intent {
    /// Creates an intent from a list of resources.
    #[must_use]
    pub const fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    /// Returns true if the intent manages no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Returns the number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }
}

impl Resource {
    /// Creates a resource with an empty attribute tree.
    #[must_use]
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            attributes: empty_attributes(),
            depends_on: Vec::new(),
            extensions: Map::new(),
        }
    }

    /// Sets the attribute tree.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Value) -> Self {
        self.attributes = attributes;
        self
    }

    /// Adds an explicit dependency.
    #[must_use]
    pub fn depends_on(mut self, key: impl Into<String>) -> Self {
        self.depends_on.push(key.into());
        self
    }
}
