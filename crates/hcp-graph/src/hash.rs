use hcp_core::Network;
use sha2::{Digest, Sha256};

use crate::network::AdjacencyGraph;

/// Computes the canonical structural hash of the graph.
///
/// Covers the node count and the sorted edge list; labels are ignored.
pub fn canonical_hash(graph: &AdjacencyGraph) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"hcp-graph:v1");
    hasher.update((graph.num_nodes() as u64).to_le_bytes());
    let edges = graph.edges();
    hasher.update((edges.len() as u64).to_le_bytes());
    for (u, v) in edges {
        hasher.update((u as u64).to_le_bytes());
        hasher.update((v as u64).to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}
