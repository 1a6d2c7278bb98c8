use hcp_core::errors::{ErrorInfo, HcpError};
use hcp_core::provenance::SchemaVersion;
use hcp_core::Network;
use serde::{Deserialize, Serialize};

use crate::network::AdjacencyGraph;

/// Serializes the graph to a compact binary representation using `bincode`.
pub fn graph_to_bytes(graph: &AdjacencyGraph) -> Result<Vec<u8>, HcpError> {
    let serializable = SerializableGraph::from_graph(graph);
    bincode::serialize(&serializable)
        .map_err(|err| HcpError::Serde(ErrorInfo::new("serialize-bytes", err.to_string())))
}

/// Restores a graph from its binary representation.
pub fn graph_from_bytes(bytes: &[u8]) -> Result<AdjacencyGraph, HcpError> {
    let serializable: SerializableGraph = bincode::deserialize(bytes)
        .map_err(|err| HcpError::Serde(ErrorInfo::new("deserialize-bytes", err.to_string())))?;
    serializable.into_graph()
}

/// Serializes the graph to a JSON string.
pub fn graph_to_json(graph: &AdjacencyGraph) -> Result<String, HcpError> {
    let serializable = SerializableGraph::from_graph(graph);
    serde_json::to_string_pretty(&serializable)
        .map_err(|err| HcpError::Serde(ErrorInfo::new("serialize-json", err.to_string())))
}

/// Restores a graph from a JSON string.
pub fn graph_from_json(json: &str) -> Result<AdjacencyGraph, HcpError> {
    let serializable: SerializableGraph = serde_json::from_str(json)
        .map_err(|err| HcpError::Serde(ErrorInfo::new("deserialize-json", err.to_string())))?;
    serializable.into_graph()
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializableGraph {
    schema_version: SchemaVersion,
    num_nodes: usize,
    labels: Vec<Option<String>>,
    edges: Vec<(usize, usize)>,
}

impl SerializableGraph {
    fn from_graph(graph: &AdjacencyGraph) -> Self {
        Self {
            schema_version: SchemaVersion::CURRENT,
            num_nodes: graph.num_nodes(),
            labels: graph.labels().to_vec(),
            edges: graph.edges(),
        }
    }

    fn into_graph(self) -> Result<AdjacencyGraph, HcpError> {
        if !self.schema_version.is_readable() {
            return Err(HcpError::Serde(
                ErrorInfo::new("schema-mismatch", "unsupported graph schema version")
                    .with_context("found", self.schema_version.to_string()),
            ));
        }
        Ok(AdjacencyGraph::from_edges(self.num_nodes, &self.edges)?.with_labels(self.labels))
    }
}
