use steiner_algorithms::TreeState;
use steiner_challenge::{Graph, Solution};

fn edge(graph: &Graph, u: usize, v: usize) -> usize {
    graph.edge_between(u, v).unwrap()
}

#[test]
fn test_rejects_non_trees() {
    let graph = Graph::new(
        4,
        vec![(0, 1, 1), (1, 2, 1), (2, 0, 1), (2, 3, 1)],
        vec![0, 3],
    )
    .unwrap();
    // Cycle 0-1-2 plus pendant 3.
    assert!(TreeState::new(&graph, &[0, 1, 2, 3]).is_err());
    // Terminal 3 left out.
    assert!(TreeState::new(&graph, &[0, 1]).is_err());
    // Two components.
    let disconnected = Graph::new(4, vec![(0, 1, 1), (2, 3, 1)], vec![0, 3]).unwrap();
    assert!(TreeState::new(&disconnected, &[0, 1]).is_err());
    assert!(TreeState::new(&graph, &[9]).is_err());
}

#[test]
fn test_prunes_steiner_leaves_and_builds_key_paths() {
    // 0 - 1 - 2 - 3 - 4 with a branch 2 - 5; terminals 0 and 3.
    let graph = Graph::new(
        6,
        vec![(0, 1, 1), (1, 2, 1), (2, 3, 1), (3, 4, 1), (2, 5, 1)],
        vec![0, 3],
    )
    .unwrap();
    let tree = TreeState::new(&graph, &[0, 1, 2, 3, 4]).unwrap();
    tree.validate().unwrap();
    assert_eq!(tree.weight(), 3);
    assert_eq!(tree.vertices(), vec![0, 1, 2, 3]);
    assert!(!tree.contains(4) && !tree.contains(5));

    assert_eq!(tree.num_key_paths(), 1);
    let id = tree.paths_at(0)[0];
    let path = tree.key_path(id).unwrap();
    assert_eq!(path.vertices, vec![0, 1, 2, 3]);
    assert_eq!(path.interior(), &[1, 2]);
    assert_eq!(path.other_end(0), 3);
    assert_eq!(path.weight, 3);
    assert_eq!(tree.path_through(1), Some(id));
    assert_eq!(tree.path_through(0), None);
    assert_eq!(tree.path_of_edge(edge(&graph, 2, 3)), Some(id));
}

#[test]
fn test_settle_and_apply_exchange() {
    // Terminals 0 and 1: tree path 0 - 2 - 1 (5 + 5), direct edge 0 - 1 (3).
    let graph = Graph::new(3, vec![(0, 2, 5), (2, 1, 5), (0, 1, 3)], vec![0, 1]).unwrap();
    let mut tree = TreeState::new(&graph, &[0, 1]).unwrap();
    assert_eq!(tree.weight(), 10);

    let change = tree.settle(&[0, 1], &[2]).unwrap();
    assert_eq!(change.gain, 7);
    assert_eq!(change.removed_vertices, vec![2]);
    assert!(change.added_vertices.is_empty());
    assert_eq!(change.touched, vec![0, 1, 2]);

    let dirty = tree.apply(&change);
    assert_eq!(dirty, vec![0, 1]);
    tree.validate().unwrap();
    assert_eq!(tree.weight(), 3);
    assert_eq!(tree.num_key_paths(), 1);
    assert_eq!(tree.to_solution(), Solution { edges: vec![(0, 1)] });
}

#[test]
fn test_settle_cascades_pruning() {
    // Terminals 0, 1, 4. Tree: 0-2, 2-1, 2-3, 3-4. Extra edge 1-4.
    let graph = Graph::new(
        5,
        vec![(0, 2, 1), (2, 1, 1), (2, 3, 4), (3, 4, 4), (1, 4, 2)],
        vec![0, 1, 4],
    )
    .unwrap();
    let mut tree = TreeState::new(&graph, &[0, 1, 2, 3]).unwrap();
    assert_eq!(tree.weight(), 10);
    assert_eq!(tree.num_key_paths(), 3);

    // Dropping 2-3 leaves 3 as a Steiner leaf, which takes 3-4 with it.
    let change = tree.settle(&[2], &[4]).unwrap();
    assert_eq!(change.removed_edges, vec![2, 3]);
    assert_eq!(change.added_edges, vec![4]);
    assert_eq!(change.removed_vertices, vec![3]);
    assert_eq!(change.gain, 6);

    tree.apply(&change);
    tree.validate().unwrap();
    assert_eq!(tree.weight(), 4);
    // 2 now has degree 2: key paths 0-2-1 and 1-4.
    assert_eq!(tree.num_key_paths(), 2);
    assert!(!tree.is_key(2));
    assert_eq!(tree.path_through(2), tree.path_of_edge(0));
}

#[test]
fn test_settle_rejects_cycles_and_noops() {
    let graph = Graph::new(3, vec![(0, 2, 5), (2, 1, 5), (0, 1, 3)], vec![0, 1]).unwrap();
    let tree = TreeState::new(&graph, &[0, 1]).unwrap();
    assert!(tree.settle(&[], &[2]).is_none());
    assert!(tree.settle(&[0], &[0]).is_none());
    assert!(tree.settle(&[2], &[]).is_none());
}

#[test]
fn test_settle_prunes_added_dead_ends() {
    // Path 0 - 1 - 2 with terminals 0 and 2; vertex 3 hangs off 1.
    let graph = Graph::new(4, vec![(0, 1, 1), (1, 2, 1), (1, 3, 1)], vec![0, 2]).unwrap();
    let tree = TreeState::new(&graph, &[0, 1]).unwrap();
    assert!(tree.settle(&[], &[2]).is_none());
}

#[test]
fn test_from_solution() {
    let graph = Graph::new(3, vec![(0, 2, 5), (2, 1, 5), (0, 1, 3)], vec![0, 1]).unwrap();
    let tree = TreeState::from_solution(
        &graph,
        &Solution {
            edges: vec![(2, 0), (1, 2)],
        },
    )
    .unwrap();
    assert_eq!(tree.weight(), 10);
    assert!(TreeState::from_solution(&graph, &Solution { edges: vec![(0, 3)] }).is_err());
}

#[test]
fn test_rooted_order_follows_changes() {
    // Terminals 0, 1, 4. Tree: 0-2, 2-1, 2-3, 3-4. Extra edge 1-4.
    let graph = Graph::new(
        5,
        vec![(0, 2, 1), (2, 1, 1), (2, 3, 4), (3, 4, 4), (1, 4, 2)],
        vec![0, 1, 4],
    )
    .unwrap();
    let mut tree = TreeState::new(&graph, &[0, 1, 2, 3]).unwrap();
    assert_eq!(tree.root(), 0);
    assert_eq!(tree.parent_edge(0), None);
    assert_eq!(tree.parent_edge(4), Some(3));
    assert_eq!(tree.depth(4), 3);
    assert!(tree.is_ancestor(2, 4) && tree.is_ancestor(3, 3));
    assert!(!tree.is_ancestor(3, 1) && !tree.is_ancestor(4, 2));
    assert_eq!(tree.meet(1, 4), 2);
    assert_eq!(tree.meet(4, 3), 3);

    let change = tree.settle(&[2], &[4]).unwrap();
    tree.apply(&change);
    tree.validate().unwrap();
    assert_eq!(tree.parent_edge(4), Some(4));
    assert_eq!(tree.depth(4), 3);
    assert!(tree.is_ancestor(1, 4));
    assert_eq!(tree.meet(0, 4), 0);
}
