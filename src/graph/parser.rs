//! Populates a resource graph from an intent.

use tracing::{debug, info, warn};

use crate::error::{GraphError, IntentError, PlanwrightError, Result, Status, StatusKind};
use crate::intent::{Intent, Resource, ResourceIndex, dependency_keys};
use crate::planner::ActionType;

use super::dag::ResourceGraph;
use super::node::ResourceNode;

/// Action every vertex starts with; the real action is decided later by
/// comparing against prior state.
const PROVISIONAL_ACTION: ActionType = ActionType::Update;

/// Builds the dependency graph of an intent.
#[derive(Debug, Clone, Copy)]
pub struct IntentParser<'a> {
    intent: &'a Intent,
}

impl<'a> IntentParser<'a> {
    /// Creates a parser over an intent.
    #[must_use]
    pub const fn new(intent: &'a Intent) -> Self {
        Self { intent }
    }

    /// Populates `graph` with every resource and its dependencies, then
    /// validates and reduces it.
    ///
    /// `graph` must hold nothing but its root. An intent without resources
    /// yields a `NotFound` warning and leaves the graph untouched.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the graph is not root-only or a key is
    /// empty, `DuplicateKey` and `UnresolvedReference` for bad keys, and
    /// `IllegalManifest` wrapping the cycle when dependencies loop. The
    /// graph must be discarded after an error.
    pub fn parse(&self, graph: &mut ResourceGraph) -> Result<Status> {
        if !graph.is_root_only() {
            return Err(IntentError::invalid_argument(
                "graph must contain only its root before parsing",
            )
            .into());
        }

        if self.intent.is_empty() {
            warn!("Intent has no resources, nothing to plan");
            return Ok(Status::warning(
                StatusKind::NotFound,
                "intent contains no resources",
            ));
        }

        let index = ResourceIndex::build(self.intent)?;
        let root = graph.root()?;

        for (key, resource) in index.iter() {
            let current = graph.add_or_get_vertex(node_for(key, resource));
            graph.connect(root, current)?;

            for dep_key in dependency_keys(resource, &index) {
                if dep_key == *key {
                    return Err(illegal_manifest(
                        GraphError::Cycle {
                            keys: vec![dep_key],
                        }
                        .into(),
                    ));
                }
                let Some(dep) = index.get(&dep_key) else {
                    return Err(IntentError::UnresolvedReference {
                        from: key.clone(),
                        key: dep_key,
                    }
                    .into());
                };
                let dep_idx = graph.add_or_get_vertex(node_for(&dep_key, dep));
                graph.connect(dep_idx, current)?;
            }
        }

        graph.validate().map_err(illegal_manifest)?;
        let removed = graph.transitive_reduction().map_err(illegal_manifest)?;

        info!(
            "Built resource graph: {} resources, {} edges ({} implied edges removed)",
            index.len(),
            graph.edge_count(),
            removed
        );
        Ok(Status::ok())
    }
}

fn node_for(key: &str, resource: &Resource) -> ResourceNode {
    ResourceNode::new(key, resource.clone(), PROVISIONAL_ACTION)
}

/// Cycles mean the intent itself is impossible.
fn illegal_manifest(err: PlanwrightError) -> PlanwrightError {
    match err {
        PlanwrightError::Graph(source @ GraphError::Cycle { .. }) => {
            debug!("Rejecting intent: {source}");
            IntentError::IllegalManifest { source }.into()
        }
        other => other,
    }
}
