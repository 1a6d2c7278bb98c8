use std::fs;
use std::path::Path;

use hcp_core::errors::{ErrorInfo, HcpError};

use crate::network::{AdjacencyGraph, MAX_NODES};

/// Reads a whitespace separated edge list (`u v` per line) from disk.
pub fn read_edge_list(path: &Path) -> Result<AdjacencyGraph, HcpError> {
    let contents =
        fs::read_to_string(path).map_err(|err| HcpError::io("edge-list-read", path, err))?;
    parse_edge_list(&contents).map_err(|err| match err {
        HcpError::Graph(info) => {
            HcpError::Graph(info.with_context("path", path.display().to_string()))
        }
        other => other,
    })
}

/// Parses an edge list. Blank lines and `#` comments are skipped; node
/// count is one more than the largest endpoint seen. Ids at or above
/// [`MAX_NODES`] are rejected.
pub fn parse_edge_list(text: &str) -> Result<AdjacencyGraph, HcpError> {
    let mut edges = Vec::new();
    let mut num_nodes = 0usize;
    for (line_no, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let mut fields = content.split_whitespace();
        let (Some(a), Some(b)) = (fields.next(), fields.next()) else {
            return Err(HcpError::Graph(
                ErrorInfo::new("edge-list-syntax", "expected two node ids")
                    .with_context("line", (line_no + 1).to_string()),
            ));
        };
        let parse = |field: &str| {
            field.parse::<usize>().map_err(|err| {
                HcpError::Graph(
                    ErrorInfo::new("edge-list-syntax", err.to_string())
                        .with_context("line", (line_no + 1).to_string())
                        .with_context("field", field),
                )
            })
        };
        let (u, v) = (parse(a)?, parse(b)?);
        if let Some(&node) = [u, v].iter().find(|&&node| node >= MAX_NODES) {
            return Err(HcpError::Graph(
                ErrorInfo::new("node-out-of-range", "node id exceeds the supported maximum")
                    .with_context("line", (line_no + 1).to_string())
                    .with_context("node", node.to_string())
                    .with_context("max", MAX_NODES.to_string()),
            ));
        }
        num_nodes = num_nodes.max(u.max(v) + 1);
        edges.push((u, v));
    }
    AdjacencyGraph::from_edges(num_nodes, &edges)
}
