//! Error types for the Planwright planning core.
//!
//! This module provides the error hierarchy for every planning stage:
//! intent loading and indexing, graph construction and validation,
//! change rendering, graph walking, and provider lookup. Every error maps
//! onto a [`Status`] kind so callers can report it uniformly.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the Planwright planning core.
#[derive(Debug, Error)]
pub enum PlanwrightError {
    /// Intent-related errors.
    #[error("Intent error: {0}")]
    Intent(#[from] IntentError),

    /// Dependency graph errors.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Change model errors.
    #[error("Change error: {0}")]
    Change(#[from] ChangeError),

    /// Graph walk errors.
    #[error("Walk error: {0}")]
    Walk(#[from] WalkError),

    /// Provider registry errors.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Intent loading and indexing errors.
#[derive(Debug, Error)]
pub enum IntentError {
    /// A required argument was missing or malformed.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// Two resources share the same key.
    #[error("Duplicate resource key: {key}")]
    DuplicateKey {
        /// The duplicated key.
        key: String,
    },

    /// A dependency points at a key that is not part of the intent.
    #[error("Resource '{from}' depends on unknown resource '{key}'")]
    UnresolvedReference {
        /// Resource declaring the dependency.
        from: String,
        /// The unknown key.
        key: String,
    },

    /// The intent describes an impossible dependency structure.
    #[error("Found circular dependency in intent: {source}")]
    IllegalManifest {
        /// The underlying graph error.
        #[source]
        source: GraphError,
    },

    /// The intent file was not found.
    #[error("Intent file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The intent document could not be parsed.
    #[error("Failed to parse intent: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// A generator response blob could not be decoded.
    #[error("Failed to decode generator {kind} #{index}: {message}")]
    Decode {
        /// Blob kind (resource or patcher).
        kind: &'static str,
        /// Position of the blob in the response.
        index: usize,
        /// Decoder message.
        message: String,
    },
}

/// Dependency graph errors.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The graph contains at least one cycle.
    #[error("cycle detected among [{}]", .keys.join(", "))]
    Cycle {
        /// Keys of every vertex taking part in a cycle, sorted.
        keys: Vec<String>,
    },

    /// The graph violates a structural rule (root, self-loop).
    #[error("invalid graph structure: {message}")]
    Structure {
        /// Description of the violation.
        message: String,
    },

    /// Some vertices cannot be reached from the root.
    #[error("vertices unreachable from root: [{}]", .keys.join(", "))]
    Unreachable {
        /// Keys of the unreachable vertices, sorted.
        keys: Vec<String>,
    },

    /// A key does not name any vertex in the graph.
    #[error("no vertex for key: {key}")]
    UnknownVertex {
        /// The missing key.
        key: String,
    },
}

/// Change model errors.
#[derive(Debug, Error)]
pub enum ChangeError {
    /// A state could not be serialized for diff rendering.
    #[error("Failed to serialize state of '{id}': {message}")]
    Serialization {
        /// Step identifier.
        id: String,
        /// Serializer message.
        message: String,
    },

    /// Step keys and steps do not cover each other.
    #[error("Inconsistent change order: {message}")]
    Inconsistent {
        /// Description of the mismatch.
        message: String,
    },
}

/// Graph walk errors.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The walk was cancelled before every vertex ran.
    #[error("Walk cancelled with {pending} vertices not started")]
    Cancelled {
        /// Number of vertices that never started.
        pending: usize,
    },

    /// A vertex visit failed or its task panicked.
    #[error("Visit of '{key}' failed: {message}")]
    TaskFailed {
        /// Vertex key.
        key: String,
        /// Failure message.
        message: String,
    },
}

/// Provider registry errors.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider spec does not name exactly one provider.
    #[error("Provider spec must name exactly one provider, found {found}")]
    InvalidSpec {
        /// Number of providers found.
        found: usize,
    },
}

/// Result type alias for Planwright operations.
pub type Result<T> = std::result::Result<T, PlanwrightError>;

/// Severity of a planning status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Severity {
    /// Everything went fine.
    Ok,
    /// Informational; the result is still usable.
    Warning,
    /// The operation failed; its output must not be used.
    Error,
}

/// Classification of a planning status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum StatusKind {
    /// No particular kind (successful statuses).
    None,
    /// Nothing to work with (e.g. an intent without resources).
    NotFound,
    /// The intent is structurally impossible.
    IllegalManifest,
    /// A required input was missing or malformed.
    InvalidArgument,
    /// Two resources share a key.
    DuplicateKeyError,
    /// A dependency names an unknown key.
    UnresolvedReferenceError,
    /// A dependency cycle exists.
    CycleError,
    /// The graph root is missing or ambiguous.
    GraphStructureError,
    /// A state could not be serialized.
    SerializationError,
    /// Anything else.
    Internal,
}

/// Outcome of a planning operation: severity, kind and a readable message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Status {
    /// Severity of the status.
    pub severity: Severity,
    /// Kind of the status.
    pub kind: StatusKind,
    /// Human-readable message.
    pub message: String,
}

impl Status {
    /// Creates a successful status.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            severity: Severity::Ok,
            kind: StatusKind::None,
            message: String::new(),
        }
    }

    /// Creates a warning status.
    #[must_use]
    pub fn warning(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
        }
    }

    /// Returns true for error-severity statuses.
    #[must_use]
    pub const fn is_err(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    /// Returns true for warning-severity statuses.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(self.severity, Severity::Warning)
    }
}

impl From<&PlanwrightError> for Status {
    fn from(err: &PlanwrightError) -> Self {
        Self {
            severity: Severity::Error,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.severity)?;
        if self.kind != StatusKind::None {
            write!(f, " ({:?})", self.kind)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl PlanwrightError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the status kind this error maps to.
    #[must_use]
    pub const fn kind(&self) -> StatusKind {
        match self {
            Self::Intent(e) => e.kind(),
            Self::Graph(e) => e.kind(),
            Self::Change(ChangeError::Serialization { .. }) => StatusKind::SerializationError,
            Self::Change(ChangeError::Inconsistent { .. }) => StatusKind::InvalidArgument,
            Self::Provider(_) => StatusKind::InvalidArgument,
            Self::Walk(_) | Self::Io(_) | Self::Internal(_) => StatusKind::Internal,
        }
    }

    /// Returns the keys of the cycle this error reports, if any.
    #[must_use]
    pub fn cycle_keys(&self) -> Option<&[String]> {
        match self {
            Self::Graph(GraphError::Cycle { keys })
            | Self::Intent(IntentError::IllegalManifest {
                source: GraphError::Cycle { keys },
            }) => Some(keys),
            _ => None,
        }
    }
}

impl IntentError {
    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns the status kind this error maps to.
    #[must_use]
    pub const fn kind(&self) -> StatusKind {
        match self {
            Self::InvalidArgument { .. } => StatusKind::InvalidArgument,
            Self::DuplicateKey { .. } => StatusKind::DuplicateKeyError,
            Self::UnresolvedReference { .. } => StatusKind::UnresolvedReferenceError,
            Self::IllegalManifest { .. } | Self::ParseError { .. } | Self::Decode { .. } => {
                StatusKind::IllegalManifest
            }
            Self::FileNotFound { .. } => StatusKind::NotFound,
        }
    }
}

impl GraphError {
    /// Creates a structure error with the given message.
    #[must_use]
    pub fn structure(message: impl Into<String>) -> Self {
        Self::Structure {
            message: message.into(),
        }
    }

    /// Returns the status kind this error maps to.
    #[must_use]
    pub const fn kind(&self) -> StatusKind {
        match self {
            Self::Cycle { .. } => StatusKind::CycleError,
            Self::Structure { .. } | Self::Unreachable { .. } => StatusKind::GraphStructureError,
            Self::UnknownVertex { .. } => StatusKind::UnresolvedReferenceError,
        }
    }
}

impl ChangeError {
    /// Creates a serialization error for a step.
    #[must_use]
    pub fn serialization(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            id: id.into(),
            message: message.into(),
        }
    }
}
