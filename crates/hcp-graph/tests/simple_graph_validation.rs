use hcp_core::{HcpError, Network};
use hcp_graph::{parse_edge_list, ring, AdjacencyGraph, MAX_NODES};

#[test]
fn self_loops_are_rejected() {
    let err = AdjacencyGraph::from_edges(3, &[(0, 1), (2, 2)]).unwrap_err();
    match err {
        HcpError::Graph(info) => {
            assert_eq!(info.code, "self-loop");
            assert_eq!(info.context.get("node"), Some(&"2".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn reversed_duplicates_are_rejected() {
    let err = AdjacencyGraph::from_edges(3, &[(0, 1), (1, 0)]).unwrap_err();
    assert_eq!(err.info().code, "duplicate-edge");
}

#[test]
fn out_of_range_endpoints_are_rejected() {
    let err = AdjacencyGraph::from_edges(2, &[(0, 5)]).unwrap_err();
    assert_eq!(err.info().code, "node-out-of-range");
}

#[test]
fn neighbour_lists_are_symmetric_and_sorted() {
    let graph = AdjacencyGraph::from_edges(4, &[(3, 0), (0, 1), (2, 0)]).unwrap();
    assert_eq!(graph.neighbors(0), &[1, 2, 3]);
    assert_eq!(graph.neighbors(3), &[0]);
    assert_eq!(graph.num_pairs(), 6);
    assert_eq!(graph.edges(), vec![(0, 1), (0, 2), (0, 3)]);
}

#[test]
fn ring_has_expected_shape() {
    let graph = ring(4).unwrap();
    assert_eq!(graph.num_edges(), 4);
    for node in 0..4 {
        assert_eq!(graph.degree(node), 2);
    }
    assert!(ring(2).is_err());
}

#[test]
fn edge_list_syntax_errors_name_the_line() {
    let err = parse_edge_list("0 1\n2\n").unwrap_err();
    assert_eq!(err.info().code, "edge-list-syntax");
    assert_eq!(err.info().context.get("line"), Some(&"2".to_string()));
}

#[test]
fn huge_edge_list_ids_are_rejected_without_allocating() {
    let err = parse_edge_list("0 1\n0 18446744073709551615\n").unwrap_err();
    assert_eq!(err.code(), "node-out-of-range");
    assert_eq!(err.info().context.get("line"), Some(&"2".to_string()));

    let err = parse_edge_list("0 4000000000").unwrap_err();
    assert_eq!(err.code(), "node-out-of-range");

    let err = parse_edge_list(&format!("0 {MAX_NODES}")).unwrap_err();
    assert_eq!(err.code(), "node-out-of-range");
}

#[test]
fn oversized_node_counts_are_rejected() {
    let err = AdjacencyGraph::from_edges(MAX_NODES + 1, &[]).unwrap_err();
    assert_eq!(err.code(), "too-many-nodes");
}
