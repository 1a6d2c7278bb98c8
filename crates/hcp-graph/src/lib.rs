#![deny(missing_docs)]
//! Immutable adjacency graphs for the hierarchical consensus partition sampler.
//!
//! Graphs are built once from an edge list (or read from GML / plain edge-list
//! files), validated to be simple and undirected, and then only queried
//! through the [`hcp_core::Network`] trait.

mod edge_list;
mod generators;
mod gml;
mod hash;
mod network;
mod serialization;

pub use edge_list::{parse_edge_list, read_edge_list};
pub use generators::{erdos_renyi, planted_partition, ring};
pub use gml::{parse_gml, read_gml};
pub use hash::canonical_hash;
pub use network::{AdjacencyGraph, MAX_NODES};
pub use serialization::{graph_from_bytes, graph_from_json, graph_to_bytes, graph_to_json};

use std::path::Path;

use hcp_core::HcpError;

/// Reads a graph from `path`, choosing the parser by file extension.
///
/// `.gml` files go through the GML reader; anything else is treated as a
/// whitespace separated edge list.
pub fn read_graph(path: &Path) -> Result<AdjacencyGraph, HcpError> {
    let is_gml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gml"))
        .unwrap_or(false);
    if is_gml {
        read_gml(path)
    } else {
        read_edge_list(path)
    }
}
