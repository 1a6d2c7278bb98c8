use std::collections::BTreeSet;

use hcp_core::errors::{ErrorInfo, HcpError};
use hcp_core::Network;

/// Largest node count a graph may have.
pub const MAX_NODES: usize = 1 << 24;

/// Simple undirected graph stored as per-node sorted neighbour lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyGraph {
    neighbors: Vec<Vec<usize>>,
    labels: Vec<Option<String>>,
    num_edges: usize,
}

impl AdjacencyGraph {
    /// Builds a graph with `num_nodes` nodes from an undirected edge list.
    ///
    /// Rejects node counts above [`MAX_NODES`], endpoints outside
    /// `0..num_nodes`, self-loops and repeated edges (in either orientation).
    pub fn from_edges(num_nodes: usize, edges: &[(usize, usize)]) -> Result<Self, HcpError> {
        if num_nodes > MAX_NODES {
            return Err(HcpError::Graph(
                ErrorInfo::new("too-many-nodes", "node count exceeds the supported maximum")
                    .with_context("num_nodes", num_nodes.to_string())
                    .with_context("max", MAX_NODES.to_string()),
            ));
        }
        let mut seen = BTreeSet::new();
        let mut neighbors = vec![Vec::new(); num_nodes];
        for &(u, v) in edges {
            for node in [u, v] {
                if node >= num_nodes {
                    return Err(HcpError::Graph(
                        ErrorInfo::new("node-out-of-range", "edge endpoint is not a node")
                            .with_context("node", node.to_string())
                            .with_context("num_nodes", num_nodes.to_string()),
                    ));
                }
            }
            if u == v {
                return Err(HcpError::Graph(
                    ErrorInfo::new("self-loop", "edge joins a node to itself")
                        .with_context("node", u.to_string()),
                ));
            }
            if !seen.insert((u.min(v), u.max(v))) {
                return Err(HcpError::Graph(
                    ErrorInfo::new("duplicate-edge", "edge appears more than once")
                        .with_context("source", u.to_string())
                        .with_context("target", v.to_string())
                        .with_hint("the likelihood model assumes a simple graph"),
                ));
            }
            neighbors[u].push(v);
            neighbors[v].push(u);
        }
        for list in &mut neighbors {
            list.sort_unstable();
        }
        Ok(Self {
            neighbors,
            labels: vec![None; num_nodes],
            num_edges: seen.len(),
        })
    }

    /// Attaches node labels (e.g. from GML). Missing labels stay `None`.
    pub fn with_labels(mut self, labels: Vec<Option<String>>) -> Self {
        let n = self.neighbors.len();
        self.labels = labels;
        self.labels.resize(n, None);
        self
    }

    /// Returns the label of `node`, if one was supplied.
    pub fn label(&self, node: usize) -> Option<&str> {
        self.labels.get(node).and_then(|label| label.as_deref())
    }

    /// Returns every edge once as `(u, v)` with `u < v`, in sorted order.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::with_capacity(self.num_edges);
        for (u, list) in self.neighbors.iter().enumerate() {
            for &v in list {
                if u < v {
                    edges.push((u, v));
                }
            }
        }
        edges
    }

    /// Returns whether `u` and `v` are adjacent.
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.neighbors
            .get(u)
            .map(|list| list.binary_search(&v).is_ok())
            .unwrap_or(false)
    }

    pub(crate) fn labels(&self) -> &[Option<String>] {
        &self.labels
    }
}

impl Network for AdjacencyGraph {
    fn num_nodes(&self) -> usize {
        self.neighbors.len()
    }

    fn num_edges(&self) -> usize {
        self.num_edges
    }

    fn neighbors(&self, node: usize) -> &[usize] {
        &self.neighbors[node]
    }
}
