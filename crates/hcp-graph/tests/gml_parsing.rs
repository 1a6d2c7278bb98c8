use hcp_core::{HcpError, Network};
use hcp_graph::{parse_gml, read_graph};

const KARATE_FRAGMENT: &str = r#"
Creator "hand written"
graph
[
  directed 0
  node
  [
    id 10
    label "ten"
  ]
  node [ id 3 label "three" ]
  node [ id 7 ]
  edge [ source 10 target 3 value 2.5 ]
  edge
  [
    source 3
    target 7
  ]
]
"#;

#[test]
fn nodes_are_renumbered_by_increasing_id() {
    let graph = parse_gml(KARATE_FRAGMENT).unwrap();
    assert_eq!(graph.num_nodes(), 3);
    assert_eq!(graph.num_edges(), 2);
    // ids 3, 7, 10 map to 0, 1, 2
    assert_eq!(graph.label(0), Some("three"));
    assert_eq!(graph.label(1), None);
    assert_eq!(graph.label(2), Some("ten"));
    assert!(graph.has_edge(0, 2));
    assert!(graph.has_edge(0, 1));
    assert!(!graph.has_edge(1, 2));
    assert_eq!(graph.degree(0), 2);
}

#[test]
fn directed_graphs_are_rejected() {
    let err = parse_gml("graph [ directed 1 node [ id 0 ] node [ id 1 ] ]").unwrap_err();
    assert_eq!(err.info().code, "gml-directed");
}

#[test]
fn unknown_edge_endpoint_is_reported() {
    let err = parse_gml("graph [ node [ id 0 ] edge [ source 0 target 4 ] ]").unwrap_err();
    match err {
        HcpError::Graph(info) => {
            assert_eq!(info.code, "gml-unknown-node");
            assert_eq!(info.context.get("id"), Some(&"4".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unbalanced_brackets_fail() {
    let err = parse_gml("graph [ node [ id 0 ]").unwrap_err();
    assert_eq!(err.info().code, "gml-unbalanced");
}

#[test]
fn missing_graph_block_fails() {
    let err = parse_gml("Creator \"nobody\"").unwrap_err();
    assert_eq!(err.info().code, "gml-no-graph");
}

#[test]
fn read_graph_dispatches_on_extension() {
    let dir = tempfile::tempdir().unwrap();
    let gml_path = dir.path().join("net.gml");
    std::fs::write(&gml_path, KARATE_FRAGMENT).unwrap();
    let edge_path = dir.path().join("net.edges");
    std::fs::write(&edge_path, "# ring\n0 1\n1 2\n2 3\n3 0\n").unwrap();

    assert_eq!(read_graph(&gml_path).unwrap().num_edges(), 2);
    let ring = read_graph(&edge_path).unwrap();
    assert_eq!(ring.num_nodes(), 4);
    assert_eq!(ring.num_edges(), 4);
}

#[test]
fn missing_file_is_a_serde_error_with_path() {
    let err = read_graph(std::path::Path::new("/nonexistent/net.gml")).unwrap_err();
    assert!(matches!(err, HcpError::Serde(_)));
    assert!(err.info().context.contains_key("path"));
}
