//! Keyed DAG engine for resource dependencies.
//!
//! The graph is an arena (a petgraph `DiGraph`) plus a key→index map, so a
//! vertex is identified by its resource key rather than by reference. An
//! edge `from → to` means `from` must complete before `to`.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::tred::{dag_to_toposorted_adjacency_list, dag_transitive_reduction_closure};
use petgraph::algo::{has_path_connecting, tarjan_scc, toposort};
use petgraph::graph::{DefaultIx, DiGraph, IndexType, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef, IntoNeighbors};
use tracing::debug;

use crate::error::{GraphError, Result};

use super::node::{ResourceNode, Vertex};

/// A DAG of resource vertices hanging off one synthetic root.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    /// Vertex arena.
    graph: DiGraph<Vertex, ()>,
    /// Resource key to vertex index.
    index: HashMap<String, NodeIndex>,
    /// Root vertices; a well-formed graph has exactly one.
    roots: Vec<NodeIndex>,
}

impl ResourceGraph {
    /// Creates a graph without any vertex.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a graph seeded with its root vertex.
    #[must_use]
    pub fn with_root() -> Self {
        let mut graph = Self::new();
        graph.add_root();
        graph
    }

    /// Adds a root vertex and returns its index.
    pub fn add_root(&mut self) -> NodeIndex {
        let idx = self.graph.add_node(Vertex::Root);
        self.roots.push(idx);
        idx
    }

    /// Returns the one designated root.
    ///
    /// # Errors
    ///
    /// Returns a structure error if the root is missing or duplicated.
    pub fn root(&self) -> Result<NodeIndex> {
        match self.roots.as_slice() {
            [root] => Ok(*root),
            [] => Err(GraphError::structure("graph has no root").into()),
            roots => Err(GraphError::structure(format!(
                "graph has {} roots, expected exactly one",
                roots.len()
            ))
            .into()),
        }
    }

    /// Returns the vertex for a key, adding `node` if the key is new.
    ///
    /// An existing vertex is returned unchanged and `node` is dropped, so
    /// callers always work with the canonical instance.
    pub fn add_or_get_vertex(&mut self, node: ResourceNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.key) {
            return idx;
        }
        let key = node.key.clone();
        let idx = self.graph.add_node(Vertex::Resource(node));
        self.index.insert(key, idx);
        idx
    }

    /// Adds a directed edge; an edge that already exists is kept as is.
    ///
    /// # Errors
    ///
    /// Returns a structure error for a self-loop.
    pub fn connect(&mut self, from: NodeIndex, to: NodeIndex) -> Result<()> {
        if from == to {
            return Err(GraphError::structure(format!(
                "self-loop on '{}'",
                self.graph[from].key()
            ))
            .into());
        }
        self.graph.update_edge(from, to, ());
        Ok(())
    }

    /// Returns the index of a resource vertex.
    #[must_use]
    pub fn index_of(&self, key: &str) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    /// Returns the resource node for a key.
    #[must_use]
    pub fn vertex(&self, key: &str) -> Option<&ResourceNode> {
        self.index_of(key)
            .and_then(|idx| self.graph[idx].as_resource())
    }

    /// Returns the vertex stored at an index.
    #[must_use]
    pub fn vertex_at(&self, idx: NodeIndex) -> Option<&Vertex> {
        self.graph.node_weight(idx)
    }

    /// Returns true if a resource vertex exists for the key.
    #[must_use]
    pub fn has_vertex(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the number of vertices, root included.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns true if the graph holds exactly one root and nothing else.
    #[must_use]
    pub fn is_root_only(&self) -> bool {
        self.roots.len() == 1 && self.graph.node_count() == 1
    }

    /// Returns every edge as a sorted `(from, to)` key pair.
    #[must_use]
    pub fn edges(&self) -> Vec<(String, String)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].key().to_string(),
                    self.graph[e.target()].key().to_string(),
                )
            })
            .collect();
        edges.sort();
        edges
    }

    /// Returns true if an edge `from → to` exists between resource keys.
    #[must_use]
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.index_of(from), self.index_of(to)) {
            (Some(a), Some(b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Returns the keys a resource directly depends on.
    #[must_use]
    pub fn dependencies(&self, key: &str) -> Vec<String> {
        self.neighbor_keys(key, Direction::Incoming)
    }

    /// Returns the keys directly depending on a resource.
    #[must_use]
    pub fn dependents(&self, key: &str) -> Vec<String> {
        self.neighbor_keys(key, Direction::Outgoing)
    }

    fn neighbor_keys(&self, key: &str, direction: Direction) -> Vec<String> {
        let Some(idx) = self.index_of(key) else {
            return Vec::new();
        };
        let keys: BTreeSet<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| self.graph[n].as_resource())
            .map(|node| node.key.clone())
            .collect();
        keys.into_iter().collect()
    }

    /// Returns the direct successors of a vertex.
    pub(crate) fn successors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Outgoing)
    }

    /// Returns the in-degree of every vertex.
    pub(crate) fn in_degrees(&self) -> HashMap<NodeIndex, usize> {
        self.graph
            .node_indices()
            .map(|idx| {
                let degree = self.graph.neighbors_directed(idx, Direction::Incoming).count();
                (idx, degree)
            })
            .collect()
    }

    /// Returns true if `to` is reachable from `from`.
    #[must_use]
    pub fn is_reachable(&self, from: NodeIndex, to: NodeIndex) -> bool {
        has_path_connecting(&self.graph, from, to, None)
    }

    /// Checks the graph invariants.
    ///
    /// # Errors
    ///
    /// Returns a structure error for a missing or duplicated root, a cycle
    /// error naming every key on a cycle, or an unreachable error naming
    /// every vertex the root cannot reach.
    pub fn validate(&self) -> Result<()> {
        let root = self.root()?;

        let cycle_keys = self.cycle_keys();
        if !cycle_keys.is_empty() {
            return Err(GraphError::Cycle { keys: cycle_keys }.into());
        }

        let mut reached = HashSet::new();
        let mut dfs = Dfs::new(&self.graph, root);
        while let Some(idx) = dfs.next(&self.graph) {
            reached.insert(idx);
        }

        let mut unreachable: Vec<String> = self
            .index
            .iter()
            .filter(|(_, idx)| !reached.contains(*idx))
            .map(|(key, _)| key.clone())
            .collect();
        if !unreachable.is_empty() {
            unreachable.sort();
            return Err(GraphError::Unreachable { keys: unreachable }.into());
        }

        debug!(
            "Graph valid: {} vertices, {} edges",
            self.vertex_count(),
            self.edge_count()
        );
        Ok(())
    }

    /// Returns the sorted keys of every vertex taking part in a cycle.
    fn cycle_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .flatten()
            .map(|idx| self.graph[idx].key().to_string())
            .collect();
        keys.sort();
        keys
    }

    /// Removes every edge implied by a longer path and returns how many
    /// edges were removed. Reachability between any two vertices is kept.
    ///
    /// # Errors
    ///
    /// Returns a cycle error if the graph is not acyclic.
    pub fn transitive_reduction(&mut self) -> Result<usize> {
        let Ok(order) = toposort(&self.graph, None) else {
            return Err(GraphError::Cycle {
                keys: self.cycle_keys(),
            }
            .into());
        };

        let (adjacency, _) =
            dag_to_toposorted_adjacency_list::<_, DefaultIx>(&self.graph, &order);
        let (reduction, _) = dag_transitive_reduction_closure(&adjacency);

        // Reduction vertices are positions in `order`
        let (reduction, order) = (&reduction, &order);
        let kept: HashSet<(NodeIndex, NodeIndex)> = reduction
            .node_indices()
            .flat_map(move |from| {
                reduction
                    .neighbors(from)
                    .map(move |to| (order[from.index()], order[to.index()]))
            })
            .collect();

        let before = self.graph.edge_count();
        self.graph.retain_edges(|graph, edge| {
            graph
                .edge_endpoints(edge)
                .is_some_and(|endpoints| kept.contains(&endpoints))
        });
        let removed = before - self.graph.edge_count();

        debug!("Transitive reduction removed {removed} edges");
        Ok(removed)
    }

    /// Groups resource keys into execution waves.
    ///
    /// Every key in a wave only depends on keys of earlier waves; keys within
    /// a wave are sorted. The root is not part of any wave.
    ///
    /// # Errors
    ///
    /// Returns a cycle error if the graph is not acyclic.
    pub fn waves(&self) -> Result<Vec<Vec<String>>> {
        let mut in_degree = self.in_degrees();
        let mut remaining: HashSet<NodeIndex> = self.graph.node_indices().collect();
        let mut waves = Vec::new();

        while !remaining.is_empty() {
            let ready: Vec<NodeIndex> = remaining
                .iter()
                .filter(|&&idx| in_degree.get(&idx).copied().unwrap_or(0) == 0)
                .copied()
                .collect();

            if ready.is_empty() {
                return Err(GraphError::Cycle {
                    keys: self.cycle_keys(),
                }
                .into());
            }

            let mut wave = Vec::new();
            for idx in ready {
                remaining.remove(&idx);
                for next in self.successors(idx) {
                    if let Some(degree) = in_degree.get_mut(&next) {
                        *degree = degree.saturating_sub(1);
                    }
                }
                if let Some(node) = self.graph[idx].as_resource() {
                    wave.push(node.key.clone());
                }
            }

            if !wave.is_empty() {
                wave.sort();
                waves.push(wave);
            }
        }

        Ok(waves)
    }

    /// Returns resource keys in an order where dependencies come first.
    ///
    /// # Errors
    ///
    /// Returns a cycle error if the graph is not acyclic.
    pub fn topological_keys(&self) -> Result<Vec<String>> {
        Ok(self.waves()?.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanwrightError;
    use crate::intent::Resource;
    use crate::planner::ActionType;

    fn node(key: &str) -> ResourceNode {
        ResourceNode::new(key, Resource::new(key, "test"), ActionType::Update)
    }

    /// Builds `root → every key` plus the given dependency edges.
    fn build(keys: &[&str], edges: &[(&str, &str)]) -> ResourceGraph {
        let mut graph = ResourceGraph::with_root();
        let root = graph.root().unwrap();
        for key in keys {
            let idx = graph.add_or_get_vertex(node(key));
            graph.connect(root, idx).unwrap();
        }
        for (from, to) in edges {
            let a = graph.index_of(from).unwrap();
            let b = graph.index_of(to).unwrap();
            graph.connect(a, b).unwrap();
        }
        graph
    }

    #[test]
    fn test_add_or_get_vertex_is_idempotent() {
        let mut graph = ResourceGraph::with_root();
        let first = graph.add_or_get_vertex(node("a"));

        let mut replacement = node("a");
        replacement.action = ActionType::Delete;
        let second = graph.add_or_get_vertex(replacement);

        assert_eq!(first, second);
        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.vertex("a").unwrap().action, ActionType::Update);
    }

    #[test]
    fn test_connect_rejects_self_loop() {
        let mut graph = ResourceGraph::with_root();
        let a = graph.add_or_get_vertex(node("a"));
        let err = graph.connect(a, a).unwrap_err();
        assert!(matches!(err, PlanwrightError::Graph(GraphError::Structure { .. })));
    }

    #[test]
    fn test_connect_does_not_duplicate_edges() {
        let mut graph = build(&["a", "b"], &[("a", "b")]);
        let a = graph.index_of("a").unwrap();
        let b = graph.index_of("b").unwrap();
        graph.connect(a, b).unwrap();
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_root_missing_or_duplicated() {
        let graph = ResourceGraph::new();
        assert!(matches!(
            graph.root(),
            Err(PlanwrightError::Graph(GraphError::Structure { .. }))
        ));

        let mut graph = ResourceGraph::with_root();
        graph.add_root();
        assert!(matches!(
            graph.validate(),
            Err(PlanwrightError::Graph(GraphError::Structure { .. }))
        ));
    }

    #[test]
    fn test_validate_names_cycle_members() {
        let graph = build(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")]);
        match graph.validate() {
            Err(PlanwrightError::Graph(GraphError::Cycle { keys })) => {
                assert_eq!(keys, vec!["a", "b", "c"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_reports_unreachable() {
        let mut graph = build(&["a"], &[]);
        graph.add_or_get_vertex(node("orphan"));
        match graph.validate() {
            Err(PlanwrightError::Graph(GraphError::Unreachable { keys })) => {
                assert_eq!(keys, vec!["orphan"]);
            }
            other => panic!("expected unreachable, got {other:?}"),
        }
    }

    #[test]
    fn test_transitive_reduction_removes_implied_edges() {
        let mut graph = build(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("a", "c")]);
        assert_eq!(graph.edge_count(), 6);

        let removed = graph.transitive_reduction().unwrap();

        // root→b, root→c and a→c are all implied by root→a→b→c
        assert_eq!(removed, 3);
        assert_eq!(
            graph.edges(),
            vec![
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "c".to_string()),
                ("root".to_string(), "a".to_string()),
            ]
        );
    }

    #[test]
    fn test_transitive_reduction_preserves_reachability() {
        let keys = ["a", "b", "c", "d", "e"];
        let mut graph = build(
            &keys,
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d"), ("a", "d"), ("d", "e"), ("b", "e")],
        );
        let before_edges = graph.edge_count();
        let indices: Vec<NodeIndex> = graph.graph.node_indices().collect();
        let before: Vec<(NodeIndex, NodeIndex, bool)> = indices
            .iter()
            .flat_map(|&u| indices.iter().map(move |&v| (u, v)))
            .map(|(u, v)| (u, v, graph.is_reachable(u, v)))
            .collect();

        graph.transitive_reduction().unwrap();

        assert!(graph.edge_count() <= before_edges);
        for (u, v, reachable) in before {
            assert_eq!(graph.is_reachable(u, v), reachable);
        }
        graph.validate().unwrap();
    }

    #[test]
    fn test_transitive_reduction_of_long_chain() {
        let keys: Vec<String> = (0..1500).map(|i| format!("r{i}")).collect();
        let mut all: Vec<&str> = vec!["ns"];
        all.extend(keys.iter().map(String::as_str));
        let mut edges: Vec<(&str, &str)> = keys.iter().map(|k| ("ns", k.as_str())).collect();
        edges.extend(keys.windows(2).map(|pair| (pair[0].as_str(), pair[1].as_str())));
        let mut graph = build(&all, &edges);

        graph.transitive_reduction().unwrap();

        // root→ns→r0→r1→...→r1499
        assert_eq!(graph.edge_count(), 1501);
        assert!(graph.has_edge("ns", "r0"));
        assert!(graph.has_edge("r1498", "r1499"));
        assert!(!graph.has_edge("ns", "r1499"));
        graph.validate().unwrap();
    }

    #[test]
    fn test_transitive_reduction_rejects_cycles() {
        let mut graph = build(&["a", "b"], &[("a", "b"), ("b", "a")]);
        assert!(matches!(
            graph.transitive_reduction(),
            Err(PlanwrightError::Graph(GraphError::Cycle { .. }))
        ));
    }

    #[test]
    fn test_waves_and_topological_order() {
        let graph = build(&["db", "cache", "web", "lb"], &[("db", "web"), ("cache", "web"), ("web", "lb")]);
        assert_eq!(
            graph.waves().unwrap(),
            vec![vec!["cache", "db"], vec!["web"], vec!["lb"]]
        );
        assert_eq!(graph.topological_keys().unwrap(), vec!["cache", "db", "web", "lb"]);
    }

    #[test]
    fn test_dependencies_and_dependents() {
        let graph = build(&["db", "cache", "web"], &[("db", "web"), ("cache", "web")]);
        assert_eq!(graph.dependencies("web"), vec!["cache", "db"]);
        assert_eq!(graph.dependents("db"), vec!["web"]);
        assert!(graph.dependencies("db").is_empty());
        assert!(graph.has_edge("db", "web"));
        assert!(!graph.has_edge("web", "db"));
    }
}
