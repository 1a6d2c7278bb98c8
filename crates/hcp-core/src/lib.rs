#![deny(missing_docs)]
//! Core traits and data types for the hierarchical consensus partition sampler.
//!
//! The sampler only ever sees a graph through the [`Network`] trait: a fixed
//! node count and O(1) access to each node's neighbour list. Everything else
//! (errors, deterministic randomness, provenance) lives here so that the graph
//! and sampler crates agree on a single vocabulary.

pub mod errors;
pub mod provenance;
pub mod rng;

pub use errors::{ErrorInfo, HcpError};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_substream_seed, RngHandle};

/// Immutable, undirected, simple graph as consumed by the sampler.
///
/// Nodes are the integers `0..num_nodes()`. Every edge `{u, v}` appears in
/// both `neighbors(u)` and `neighbors(v)` exactly once and `u != v`.
pub trait Network {
    /// Number of nodes `N`.
    fn num_nodes(&self) -> usize;

    /// Number of undirected edges `|E|`.
    fn num_edges(&self) -> usize;

    /// Neighbour list of `node`.
    fn neighbors(&self, node: usize) -> &[usize];

    /// Degree of `node`.
    fn degree(&self, node: usize) -> usize {
        self.neighbors(node).len()
    }

    /// Number of unordered node pairs, `N(N-1)/2`.
    fn num_pairs(&self) -> u64 {
        let n = self.num_nodes() as u64;
        n * n.saturating_sub(1) / 2
    }
}

impl<T: Network + ?Sized> Network for &T {
    fn num_nodes(&self) -> usize {
        (**self).num_nodes()
    }

    fn num_edges(&self) -> usize {
        (**self).num_edges()
    }

    fn neighbors(&self, node: usize) -> &[usize] {
        (**self).neighbors(node)
    }

    fn degree(&self, node: usize) -> usize {
        (**self).degree(node)
    }
}
