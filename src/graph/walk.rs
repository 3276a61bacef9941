//! Dependency-ordered, parallel graph walk.
//!
//! A coordinator keeps a predecessor countdown per vertex and spawns every
//! vertex whose predecessors all succeeded on a `JoinSet`, up to the
//! configured parallelism. Dependents of a failed vertex never run.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use petgraph::graph::NodeIndex;
use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{PlanwrightError, Result, WalkError};

use super::dag::ResourceGraph;
use super::node::{ResourceNode, Vertex};

/// What the walk does after a vertex fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Start nothing new once a vertex failed; in-flight visits finish.
    FailFast,
    /// Keep visiting every vertex whose dependencies succeeded.
    ContinueOnError,
}

/// Walk configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkConfig {
    /// Failure policy.
    pub policy: FailurePolicy,
    /// Maximum number of concurrent visits.
    pub parallelism: usize,
    /// Stop starting new visits after this long.
    pub timeout: Option<Duration>,
}

impl WalkConfig {
    /// Default number of concurrent visits.
    pub const DEFAULT_PARALLELISM: usize = 4;

    /// Creates a configuration with the given policy.
    #[must_use]
    pub const fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            parallelism: Self::DEFAULT_PARALLELISM,
            timeout: None,
        }
    }

    /// Sets the maximum number of concurrent visits (at least one).
    #[must_use]
    pub const fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = if parallelism == 0 { 1 } else { parallelism };
        self
    }

    /// Sets the walk timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Outcome of one vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum VisitOutcome {
    /// The visit completed.
    Succeeded,
    /// The visit returned an error or panicked.
    Failed(String),
    /// Not visited because a dependency failed or the walk stopped early.
    Skipped,
    /// Not visited because the walk was cancelled.
    Cancelled,
}

/// Result of a walk.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WalkReport {
    outcomes: BTreeMap<String, VisitOutcome>,
    completed: Vec<String>,
}

impl WalkReport {
    /// Returns the outcome of a vertex.
    #[must_use]
    pub fn outcome(&self, key: &str) -> Option<&VisitOutcome> {
        self.outcomes.get(key)
    }

    /// Returns every outcome by key.
    #[must_use]
    pub const fn outcomes(&self) -> &BTreeMap<String, VisitOutcome> {
        &self.outcomes
    }

    /// Returns the keys of visited vertices in the order their visit ended.
    #[must_use]
    pub fn completion_order(&self) -> &[String] {
        &self.completed
    }

    /// Returns the failed keys with their messages.
    #[must_use]
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(key, outcome)| match outcome {
                VisitOutcome::Failed(message) => Some((key.as_str(), message.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Returns how many vertices ended with the given outcome.
    #[must_use]
    pub fn count(&self, outcome: &VisitOutcome) -> usize {
        self.outcomes
            .values()
            .filter(|o| std::mem::discriminant(*o) == std::mem::discriminant(outcome))
            .count()
    }

    /// Returns true if every vertex succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes
            .values()
            .all(|o| matches!(o, VisitOutcome::Succeeded))
    }

    /// Converts an incomplete walk into an error.
    ///
    /// # Errors
    ///
    /// Returns `Cancelled` if any vertex was cancelled, otherwise the first
    /// failure by key.
    pub fn into_result(self) -> Result<Self> {
        let pending = self.count(&VisitOutcome::Cancelled);
        if pending > 0 {
            return Err(WalkError::Cancelled { pending }.into());
        }
        if let Some((key, message)) = self.failures().first() {
            return Err(WalkError::TaskFailed {
                key: (*key).to_string(),
                message: (*message).to_string(),
            }
            .into());
        }
        Ok(self)
    }
}

/// Walks a resource graph in dependency order.
#[derive(Debug, Clone)]
pub struct Walker {
    config: WalkConfig,
    cancel: CancellationToken,
}

impl Walker {
    /// Creates a walker.
    #[must_use]
    pub fn new(config: WalkConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses an external cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a handle that cancels this walker's walks.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Visits every resource vertex after all of its dependencies succeeded.
    ///
    /// Independent vertices run concurrently. Once the walk is cancelled or
    /// times out no new visit starts, but running visits are awaited.
    ///
    /// # Errors
    ///
    /// Returns a structure error if the graph has no single root. Visit
    /// failures are reported in the [`WalkReport`].
    pub async fn walk<F, Fut, E>(&self, graph: &ResourceGraph, visit: F) -> Result<WalkReport>
    where
        F: Fn(ResourceNode) -> Fut,
        Fut: Future<Output = std::result::Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let root = graph.root()?;
        let token = self.cancel.child_token();
        let timer = self.config.timeout.map(|timeout| {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                warn!("Walk timed out after {timeout:?}, no new visits will start");
                token.cancel();
            })
        });

        info!(
            "Walking {} resources with parallelism {} ({:?})",
            graph.vertex_count().saturating_sub(1),
            self.config.parallelism,
            self.config.policy
        );

        let mut state = WalkState::new(graph, self.config.policy);
        state.release(root);

        let mut tasks = JoinSet::new();
        let mut cancel_seen = false;

        loop {
            while !state.halted && !token.is_cancelled() && tasks.len() < self.config.parallelism
            {
                let Some(idx) = state.ready.pop_front() else {
                    break;
                };
                let Some(node) = graph.vertex_at(idx).and_then(Vertex::as_resource).cloned() else {
                    state.release(idx);
                    continue;
                };
                debug!("Visiting {}", node.key);
                let key = node.key.clone();
                let visiting = visit(node);
                tasks.spawn(async move {
                    let outcome = tokio::spawn(async move {
                        visiting.await.map_err(|e| e.to_string())
                    })
                    .await;
                    (idx, key, outcome)
                });
            }

            if tasks.is_empty() {
                break;
            }

            tokio::select! {
                () = token.cancelled(), if !cancel_seen => {
                    cancel_seen = true;
                    info!("Walk cancelled, waiting for {} running visits", tasks.len());
                }
                joined = tasks.join_next() => {
                    let Some(joined) = joined else { break };
                    let (idx, key, outcome) = joined.map_err(|e| {
                        PlanwrightError::internal(format!("walk coordinator task failed: {e}"))
                    })?;
                    match outcome {
                        Ok(Ok(())) => state.succeed(idx, key),
                        Ok(Err(message)) => state.fail(idx, key, message),
                        Err(join_err) => {
                            let message = WalkError::TaskFailed {
                                key: key.clone(),
                                message: join_err.to_string(),
                            }
                            .to_string();
                            state.fail(idx, key, message);
                        }
                    }
                }
            }
        }

        if let Some(timer) = timer {
            timer.abort();
        }

        let report = state.finish(token.is_cancelled());
        info!(
            "Walk finished: {} succeeded, {} failed, {} skipped, {} cancelled",
            report.count(&VisitOutcome::Succeeded),
            report.count(&VisitOutcome::Failed(String::new())),
            report.count(&VisitOutcome::Skipped),
            report.count(&VisitOutcome::Cancelled)
        );
        Ok(report)
    }
}

/// Coordinator bookkeeping for one walk.
struct WalkState<'g> {
    graph: &'g ResourceGraph,
    policy: FailurePolicy,
    pending_preds: HashMap<NodeIndex, usize>,
    ready: VecDeque<NodeIndex>,
    outcomes: BTreeMap<String, VisitOutcome>,
    completed: Vec<String>,
    halted: bool,
}

impl<'g> WalkState<'g> {
    fn new(graph: &'g ResourceGraph, policy: FailurePolicy) -> Self {
        Self {
            graph,
            policy,
            pending_preds: graph.in_degrees(),
            ready: VecDeque::new(),
            outcomes: BTreeMap::new(),
            completed: Vec::new(),
            halted: false,
        }
    }

    fn key_of(&self, idx: NodeIndex) -> Option<&'g str> {
        self.graph
            .vertex_at(idx)
            .and_then(Vertex::as_resource)
            .map(|node| node.key.as_str())
    }

    /// Counts `idx` as done for its successors and queues the ones now ready.
    fn release(&mut self, idx: NodeIndex) {
        let mut newly_ready = Vec::new();
        for next in self.graph.successors(idx) {
            if let Some(pending) = self.pending_preds.get_mut(&next) {
                *pending = pending.saturating_sub(1);
                if *pending == 0 {
                    newly_ready.push(next);
                }
            }
        }
        newly_ready.retain(|&next| {
            self.key_of(next)
                .is_none_or(|key| !self.outcomes.contains_key(key))
        });
        newly_ready.sort_by_key(|&next| self.key_of(next));
        self.ready.extend(newly_ready);
    }

    fn succeed(&mut self, idx: NodeIndex, key: String) {
        debug!("Visited {key}");
        self.outcomes.insert(key.clone(), VisitOutcome::Succeeded);
        self.completed.push(key);
        self.release(idx);
    }

    fn fail(&mut self, idx: NodeIndex, key: String, message: String) {
        warn!("Visit of {key} failed: {message}");
        self.outcomes.insert(key.clone(), VisitOutcome::Failed(message));
        self.completed.push(key);
        self.skip_dependents(idx);
        if self.policy == FailurePolicy::FailFast {
            self.halted = true;
        }
    }

    fn skip_dependents(&mut self, idx: NodeIndex) {
        let mut stack: Vec<NodeIndex> = self.graph.successors(idx).collect();
        while let Some(next) = stack.pop() {
            let Some(key) = self.key_of(next) else {
                continue;
            };
            if self.outcomes.contains_key(key) {
                continue;
            }
            debug!("Skipping {key}: a dependency failed");
            self.outcomes.insert(key.to_string(), VisitOutcome::Skipped);
            stack.extend(self.graph.successors(next));
        }
    }

    fn finish(mut self, cancelled: bool) -> WalkReport {
        let unvisited = if cancelled {
            VisitOutcome::Cancelled
        } else {
            VisitOutcome::Skipped
        };
        let indices: Vec<NodeIndex> = self.pending_preds.keys().copied().collect();
        for idx in indices {
            if let Some(key) = self.key_of(idx) {
                self.outcomes
                    .entry(key.to_string())
                    .or_insert_with(|| unvisited.clone());
            }
        }
        WalkReport {
            outcomes: self.outcomes,
            completed: self.completed,
        }
    }
}
