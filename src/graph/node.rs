//! Graph vertex types.

use crate::intent::Resource;
use crate::planner::ActionType;

/// Key under which the synthetic root is rendered.
pub const ROOT_KEY: &str = "root";

/// A resource vertex: the resource, its key and the planned action.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    /// Resource key; the vertex identity.
    pub key: String,
    /// The resource this vertex stands for.
    pub resource: Resource,
    /// Planned action for the resource.
    pub action: ActionType,
}

impl ResourceNode {
    /// Creates a resource node.
    #[must_use]
    pub fn new(key: impl Into<String>, resource: Resource, action: ActionType) -> Self {
        Self {
            key: key.into(),
            resource,
            action,
        }
    }
}

/// A vertex of the resource graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Vertex {
    /// The synthetic root every resource hangs off.
    Root,
    /// A resource vertex.
    Resource(ResourceNode),
}

impl Vertex {
    /// Returns the key of the vertex (`root` for the root).
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Root => ROOT_KEY,
            Self::Resource(node) => &node.key,
        }
    }

    /// Returns the resource node, if this is not the root.
    #[must_use]
    pub const fn as_resource(&self) -> Option<&ResourceNode> {
        match self {
            Self::Root => None,
            Self::Resource(node) => Some(node),
        }
    }

    /// Returns true for the root vertex.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }
}
