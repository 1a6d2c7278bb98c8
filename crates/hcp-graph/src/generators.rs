use hcp_core::errors::{ErrorInfo, HcpError};
use hcp_core::rng::RngHandle;
use rand::Rng;

use crate::network::AdjacencyGraph;

/// Cycle graph `0 - 1 - ... - (n-1) - 0`. Requires at least three nodes.
pub fn ring(n_nodes: usize) -> Result<AdjacencyGraph, HcpError> {
    if n_nodes < 3 {
        return Err(HcpError::Graph(
            ErrorInfo::new("ring-too-small", "a simple ring needs at least three nodes")
                .with_context("n_nodes", n_nodes.to_string()),
        ));
    }
    let edges: Vec<_> = (0..n_nodes).map(|u| (u, (u + 1) % n_nodes)).collect();
    AdjacencyGraph::from_edges(n_nodes, &edges)
}

/// G(n, p) random graph with deterministic randomness.
pub fn erdos_renyi(
    n_nodes: usize,
    p: f64,
    rng: &mut RngHandle,
) -> Result<AdjacencyGraph, HcpError> {
    check_probability(p, "p")?;
    let mut edges = Vec::new();
    for u in 0..n_nodes {
        for v in (u + 1)..n_nodes {
            if rng.gen_bool(p) {
                edges.push((u, v));
            }
        }
    }
    AdjacencyGraph::from_edges(n_nodes, &edges)
}

/// Planted partition graph: `blocks` contiguous blocks of `block_size` nodes,
/// pairs inside a block connect with `p_in`, across blocks with `p_out`.
pub fn planted_partition(
    blocks: usize,
    block_size: usize,
    p_in: f64,
    p_out: f64,
    rng: &mut RngHandle,
) -> Result<AdjacencyGraph, HcpError> {
    check_probability(p_in, "p_in")?;
    check_probability(p_out, "p_out")?;
    let n_nodes = blocks * block_size;
    let mut edges = Vec::new();
    for u in 0..n_nodes {
        for v in (u + 1)..n_nodes {
            let p = if u / block_size == v / block_size {
                p_in
            } else {
                p_out
            };
            if rng.gen_bool(p) {
                edges.push((u, v));
            }
        }
    }
    AdjacencyGraph::from_edges(n_nodes, &edges)
}

fn check_probability(p: f64, name: &str) -> Result<(), HcpError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(HcpError::Graph(
            ErrorInfo::new("invalid-probability", "edge probability must lie in [0, 1]")
                .with_context(name, p.to_string()),
        ))
    }
}
