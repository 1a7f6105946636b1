use serde_json::json;
use std::path::Path;
use steiner_challenge::{Graph, Solution, Track, BUILD_TIME_PATH};

fn star() -> Graph {
    Graph::new(4, vec![(0, 3, 1), (1, 3, 1), (2, 3, 1)], vec![0, 1, 2]).unwrap()
}

#[test]
fn test_graph_rejects_invalid_input() {
    assert!(Graph::new(0, vec![], vec![0]).is_err());
    assert!(Graph::new(3, vec![(0, 1, 1)], vec![]).is_err());
    assert!(Graph::new(3, vec![(0, 3, 1)], vec![0]).is_err());
    assert!(Graph::new(3, vec![(1, 1, 1)], vec![0]).is_err());
    assert!(Graph::new(3, vec![(0, 1, 1)], vec![5]).is_err());
}

#[test]
fn test_graph_dedupes_terminals_and_indexes_edges() {
    let graph = Graph::new(3, vec![(0, 1, 4), (1, 2, 2), (0, 1, 3)], vec![2, 0, 2]).unwrap();
    assert_eq!(graph.terminals, vec![2, 0]);
    assert!(graph.is_terminal(0) && !graph.is_terminal(1));
    assert_eq!(graph.degree(1), 3);
    // Parallel edges resolve to the lightest one.
    assert_eq!(graph.edge_between(1, 0), Some(2));
    assert_eq!(graph.edge_between(0, 2), None);
}

#[test]
fn test_graph_roundtrips_through_json() {
    let graph = star();
    let value = serde_json::to_value(&graph).unwrap();
    assert_eq!(value["num_nodes"], json!(4));
    assert_eq!(value["terminals"], json!([0, 1, 2]));
    let restored: Graph = serde_json::from_value(value).unwrap();
    let restored = restored.reindexed().unwrap();
    assert_eq!(restored.neighbors(3).len(), 3);
}

#[test]
fn test_evaluate_solution() {
    let graph = star();
    let solution = Solution {
        edges: vec![(0, 3), (3, 1), (2, 3)],
    };
    assert_eq!(graph.evaluate_solution(&solution).unwrap(), 3);

    // Missing terminal 2.
    let partial = Solution {
        edges: vec![(0, 3), (1, 3)],
    };
    assert!(graph.verify_solution(&partial).is_err());

    // Unknown edge.
    let unknown = Solution {
        edges: vec![(0, 1), (1, 3), (2, 3)],
    };
    assert!(graph.verify_solution(&unknown).is_err());

    // Duplicate edge.
    let duplicate = Solution {
        edges: vec![(0, 3), (3, 0), (1, 3), (2, 3)],
    };
    assert!(graph.verify_solution(&duplicate).is_err());
}

#[test]
fn test_evaluate_solution_rejects_cycles_and_steiner_leaves() {
    let graph = Graph::new(
        5,
        vec![(0, 1, 1), (1, 2, 1), (2, 0, 1), (2, 3, 1), (3, 4, 1)],
        vec![0, 2],
    )
    .unwrap();
    let cycle = Solution {
        edges: vec![(0, 1), (1, 2), (0, 2)],
    };
    assert!(graph.verify_solution(&cycle).is_err());

    let leaf = Solution {
        edges: vec![(0, 2), (2, 3)],
    };
    assert!(graph.verify_solution(&leaf).is_err());

    let disconnected = Solution {
        edges: vec![(0, 1), (2, 3), (3, 4)],
    };
    assert!(graph.verify_solution(&disconnected).is_err());

    let single_edge = Solution {
        edges: vec![(0, 2)],
    };
    assert_eq!(graph.evaluate_solution(&single_edge).unwrap(), 1);
}

#[test]
fn test_single_terminal_is_solved_by_empty_tree() {
    let graph = Graph::new(2, vec![(0, 1, 5)], vec![1]).unwrap();
    assert_eq!(graph.evaluate_solution(&Solution::new()).unwrap(), 0);
}

#[test]
fn test_read_gr_fixture() {
    let path = Path::new(BUILD_TIME_PATH).join("tests/instances/star.gr");
    let graph = Graph::read_gr(&path).unwrap();
    assert_eq!(graph.num_nodes, 4);
    assert_eq!(graph.num_edges(), 3);
    assert_eq!(graph.terminals, vec![0, 1, 2]);
    assert_eq!(graph.edge(2).u, 2);
    assert_eq!(graph.edge(2).v, 3);
}

#[test]
fn test_gr_rejects_bad_input() {
    assert!(Graph::from_gr("SECTION Graph\nEdges 0\nEND\n").is_err());
    assert!(Graph::from_gr("SECTION Graph\nNodes 2\nEdges 2\nE 1 2 1\nEND\nSECTION Terminals\nT 1\nEND\n").is_err());
    assert!(Graph::from_gr("SECTION Graph\nNodes 2\nE 1 3 1\nEND\nSECTION Terminals\nT 1\nEND\n").is_err());
    assert!(Graph::from_gr("SECTION Graph\nNodes 2\nE 1 2 x\nEND\nSECTION Terminals\nT 1\nEND\n").is_err());
    assert!(Graph::from_gr("SECTION Graph\nNodes 2\nE 1 2 1\nEND\n").is_err());
}

#[test]
fn test_gr_writer_is_readable() {
    let graph = star();
    let parsed = Graph::from_gr(&graph.to_gr()).unwrap();
    assert_eq!(parsed.edges, graph.edges);
    assert_eq!(parsed.terminals, graph.terminals);
}

#[test]
fn test_pace_solution_format() {
    let graph = star();
    let solution = Solution::from_edge_ids(&graph, [2, 0, 1]);
    assert_eq!(solution.edges, vec![(0, 3), (1, 3), (2, 3)]);
    let text = solution.to_pace(3);
    assert!(text.starts_with("VALUE 3\n1 4\n"));
    assert_eq!(Solution::from_pace(&text).unwrap(), solution);
    assert!(Solution::from_pace("VALUE 1\n0 1\n").is_err());
}

#[test]
fn test_generate_instance() {
    let track = Track {
        num_nodes: 60,
        num_terminals: 8,
        extra_edges_per_node: 2,
        max_weight: 20,
    };
    let a = Graph::generate_instance(&[7; 32], &track).unwrap();
    let b = Graph::generate_instance(&[7; 32], &track).unwrap();
    let c = Graph::generate_instance(&[8; 32], &track).unwrap();
    assert_eq!(a.edges, b.edges);
    assert_eq!(a.terminals, b.terminals);
    assert_ne!(a.edges, c.edges);

    assert_eq!(a.num_nodes, 60);
    assert_eq!(a.num_terminals(), 8);
    assert_eq!(a.num_edges(), 59 + 120);
    assert!(a.edges.iter().all(|e| (1..=20).contains(&e.weight)));

    // The first n - 1 edges form a spanning tree.
    let tree = Solution::from_edge_ids(&a, 0..59);
    assert_eq!(tree.vertices(&a).len(), 60);

    assert!(Graph::generate_instance(&[0; 32], &Track { num_terminals: 0, ..track }).is_err());
    assert!(Graph::generate_instance(&[0; 32], &Track { num_nodes: 1, ..track }).is_err());
}
