//! Step dependency graph analysis
//!
//! Builds a directed graph over step indices and answers structural
//! questions about it: cycles, topological order, critical path and
//! level-based parallel groups.
//!
//! How edges are derived from a step list is an [`AdjacencyPolicy`]. The
//! default [`SequentialPolicy`] makes step *i* depend on step *i-1*; under it
//! cycle detection is always false and the critical path is the whole list.
//! [`ExplicitEdges`] takes an edge list from the caller instead.
//!
//! # Example
//!
//! ```text
//! steps:  [http-request, transform, persist]
//! edges:  0 → 1 → 2
//! topo:   [0, 1, 2]
//! groups: [[0], [1], [2]]
//! ```

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use crate::types::{Step, WorkflowDefinition};

/// Rule that turns an ordered step list into dependency edges
pub trait AdjacencyPolicy: Send + Sync {
    /// Edges as (from, to) pairs: `to` runs after `from`
    fn edges(&self, steps: &[Step]) -> Vec<(usize, usize)>;

    fn name(&self) -> &str;
}

/// Each step depends on the one before it
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialPolicy;

impl AdjacencyPolicy for SequentialPolicy {
    fn edges(&self, steps: &[Step]) -> Vec<(usize, usize)> {
        (1..steps.len()).map(|idx| (idx - 1, idx)).collect()
    }

    fn name(&self) -> &str {
        "sequential"
    }
}

/// Caller-supplied edge list. Edges referencing missing steps are dropped.
#[derive(Debug, Clone, Default)]
pub struct ExplicitEdges {
    edges: Vec<(usize, usize)>,
}

impl ExplicitEdges {
    pub fn new(edges: Vec<(usize, usize)>) -> Self {
        Self { edges }
    }
}

impl AdjacencyPolicy for ExplicitEdges {
    fn edges(&self, steps: &[Step]) -> Vec<(usize, usize)> {
        self.edges
            .iter()
            .copied()
            .filter(|&(from, to)| {
                let in_range = from < steps.len() && to < steps.len();
                if !in_range {
                    tracing::debug!(from, to, steps = steps.len(), "Dropping out-of-range edge");
                }
                in_range
            })
            .collect()
    }

    fn name(&self) -> &str {
        "explicit"
    }
}

/// Structural facts about a definition, as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub policy: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub has_cycle: bool,
    pub topological_order: Vec<usize>,
    pub critical_path: Vec<usize>,
    pub parallel_groups: Vec<Vec<usize>>,
}

/// Dependency graph over step indices. Node weight is the step index.
pub struct GraphAnalyzer {
    graph: DiGraph<usize, ()>,
    policy: String,
}

impl GraphAnalyzer {
    /// Analyzer using the sequential dependency assumption
    pub fn new(definition: &WorkflowDefinition) -> Self {
        Self::with_policy(definition, &SequentialPolicy)
    }

    pub fn with_policy(definition: &WorkflowDefinition, policy: &dyn AdjacencyPolicy) -> Self {
        let edges = policy.edges(&definition.steps);
        let mut analyzer = Self::from_edges(definition.len(), &edges);
        analyzer.policy = policy.name().to_string();
        analyzer
    }

    /// Build directly from a node count and edge list. Out-of-range edges are ignored.
    pub fn from_edges(node_count: usize, edges: &[(usize, usize)]) -> Self {
        let mut graph = DiGraph::with_capacity(node_count, edges.len());
        for idx in 0..node_count {
            graph.add_node(idx);
        }
        for &(from, to) in edges {
            if from < node_count && to < node_count {
                graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
            }
        }
        Self {
            graph,
            policy: "explicit".to_string(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn successors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors_directed(NodeIndex::new(node), Direction::Outgoing)
            .map(|n| n.index())
    }

    fn predecessors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors_directed(NodeIndex::new(node), Direction::Incoming)
            .map(|n| n.index())
    }

    /// True when some dependency chain returns to a step already on it.
    /// Iterative, so step count does not bound stack depth.
    pub fn detect_cycles(&self) -> bool {
        toposort(&self.graph, None).is_err()
    }

    /// Kahn's algorithm. Empty when a cycle keeps some node from reaching in-degree zero.
    pub fn topological_order(&self) -> Vec<usize> {
        let node_count = self.node_count();
        let mut in_degree: Vec<usize> = (0..node_count)
            .map(|node| self.predecessors(node).count())
            .collect();

        let mut queue: VecDeque<usize> = (0..node_count)
            .filter(|&node| in_degree[node] == 0)
            .collect();
        let mut order = Vec::with_capacity(node_count);

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for next in self.successors(node) {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() != node_count {
            return vec![];
        }
        order
    }

    /// Longest dependency chain, from its first step to its last.
    ///
    /// Falls back to every index in order when the graph is cyclic.
    pub fn critical_path(&self) -> Vec<usize> {
        let node_count = self.node_count();
        if node_count == 0 {
            return vec![];
        }

        let order = self.topological_order();
        if order.is_empty() {
            return (0..node_count).collect();
        }

        let mut length = vec![0usize; node_count];
        let mut parent: Vec<Option<usize>> = vec![None; node_count];
        for &node in &order {
            for next in self.successors(node) {
                if length[next] < length[node] + 1 {
                    length[next] = length[node] + 1;
                    parent[next] = Some(node);
                }
            }
        }

        // First node with the maximum length wins ties
        let end = (0..node_count).fold(0, |best, node| {
            if length[node] > length[best] {
                node
            } else {
                best
            }
        });

        let mut path = vec![end];
        let mut current = end;
        while let Some(prev) = parent[current] {
            path.push(prev);
            current = prev;
        }
        path.reverse();
        path
    }

    /// Nodes grouped by dependency level, ordered by increasing level.
    ///
    /// Falls back to one group per node when the graph is cyclic.
    pub fn parallel_groups(&self) -> Vec<Vec<usize>> {
        let node_count = self.node_count();
        if node_count == 0 {
            return vec![];
        }

        let order = self.topological_order();
        if order.is_empty() {
            return (0..node_count).map(|node| vec![node]).collect();
        }

        let mut level = vec![0usize; node_count];
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for &node in &order {
            level[node] = self
                .predecessors(node)
                .map(|pred| level[pred] + 1)
                .max()
                .unwrap_or(0);
            groups.entry(level[node]).or_default().push(node);
        }

        groups.into_values().collect()
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            policy: self.policy.clone(),
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            has_cycle: self.detect_cycles(),
            topological_order: self.topological_order(),
            critical_path: self.critical_path(),
            parallel_groups: self.parallel_groups(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(types: &[&str]) -> WorkflowDefinition {
        WorkflowDefinition::new(types.iter().map(|t| Step::new(*t)).collect())
    }

    #[test]
    fn test_empty_definition() {
        let analyzer = GraphAnalyzer::new(&WorkflowDefinition::default());
        assert!(!analyzer.detect_cycles());
        assert!(analyzer.topological_order().is_empty());
        assert!(analyzer.critical_path().is_empty());
        assert!(analyzer.parallel_groups().is_empty());
    }

    #[test]
    fn test_single_node_has_no_cycle() {
        let analyzer = GraphAnalyzer::new(&linear(&["transform"]));
        assert!(!analyzer.detect_cycles());
        assert_eq!(analyzer.critical_path(), vec![0]);
        assert_eq!(analyzer.parallel_groups(), vec![vec![0]]);
    }

    #[test]
    fn test_sequential_chain() {
        let analyzer = GraphAnalyzer::new(&linear(&["http-request", "transform", "persist"]));
        assert_eq!(analyzer.edge_count(), 2);
        assert!(!analyzer.detect_cycles());
        assert_eq!(analyzer.topological_order(), vec![0, 1, 2]);
        assert_eq!(analyzer.critical_path(), vec![0, 1, 2]);
        assert_eq!(analyzer.parallel_groups(), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_back_edge_is_a_cycle() {
        let analyzer = GraphAnalyzer::from_edges(3, &[(0, 1), (1, 2), (2, 0)]);
        assert!(analyzer.detect_cycles());
        assert!(analyzer.topological_order().is_empty());
        assert_eq!(analyzer.critical_path(), vec![0, 1, 2]);
        assert_eq!(analyzer.parallel_groups(), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let analyzer = GraphAnalyzer::from_edges(1, &[(0, 0)]);
        assert!(analyzer.detect_cycles());
    }

    #[test]
    fn test_diamond_groups_and_critical_path() {
        // 0 → {1, 2} → 3, plus 3 → 4
        let definition = linear(&["http-request", "http-request", "http-request", "transform", "persist"]);
        let policy = ExplicitEdges::new(vec![(0, 1), (0, 2), (1, 3), (2, 3), (3, 4)]);
        let analyzer = GraphAnalyzer::with_policy(&definition, &policy);

        assert!(!analyzer.detect_cycles());
        let groups = analyzer.parallel_groups();
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0], vec![0]);
        let mut second = groups[1].clone();
        second.sort();
        assert_eq!(second, vec![1, 2]);
        assert_eq!(groups[2], vec![3]);
        assert_eq!(groups[3], vec![4]);

        let path = analyzer.critical_path();
        assert_eq!(path.len(), 4);
        assert_eq!(path[0], 0);
        assert_eq!(&path[2..], &[3, 4]);
    }

    #[test]
    fn test_explicit_edges_drop_out_of_range() {
        let definition = linear(&["transform", "persist"]);
        let policy = ExplicitEdges::new(vec![(0, 1), (1, 7)]);
        let analyzer = GraphAnalyzer::with_policy(&definition, &policy);
        assert_eq!(analyzer.edge_count(), 1);
        assert_eq!(analyzer.summary().policy, "explicit");
    }

    #[test]
    fn test_no_edges_gives_trivial_path() {
        let analyzer = GraphAnalyzer::from_edges(3, &[]);
        assert_eq!(analyzer.critical_path(), vec![0]);
        assert_eq!(analyzer.parallel_groups(), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_long_chain_with_back_edge() {
        let steps = 200_000;
        let mut edges: Vec<(usize, usize)> = (1..steps).map(|idx| (idx - 1, idx)).collect();
        assert!(!GraphAnalyzer::from_edges(steps, &edges).detect_cycles());

        edges.push((steps - 1, 0));
        let analyzer = GraphAnalyzer::from_edges(steps, &edges);
        assert!(analyzer.detect_cycles());
        assert!(analyzer.topological_order().is_empty());
    }
}
