use steiner_algorithms::neighborhood::key_vertex::exchange_key_path;
use steiner_algorithms::neighborhood::reconnect::Reconnector;
use steiner_algorithms::neighborhood::steiner_vertex::Insertion;
use steiner_algorithms::TreeState;
use steiner_challenge::Graph;

const N: usize = 1000;

/// A path 0 - 1 - ... - N-1 of 10-edges with terminals 0, 3, N-4 and N-1,
/// plus a 5-edge shortcut across each end segment.
fn long_path() -> Graph {
    let mut edges: Vec<(usize, usize, u64)> = (0..N - 1).map(|i| (i, i + 1, 10)).collect();
    edges.push((0, 3, 5));
    edges.push((N - 4, N - 1, 5));
    Graph::new(N, edges, vec![0, 3, N - 4, N - 1]).unwrap()
}

#[test]
fn test_exchange_stays_near_the_removed_path() {
    let graph = long_path();
    let tree = TreeState::new(&graph, &(0..N - 1).collect::<Vec<_>>()).unwrap();
    assert_eq!(tree.num_vertices(), N);
    let mut reconnector = Reconnector::new(&graph);

    for (interior, shortcut) in [(1, N - 1), (N - 2, N)] {
        let id = tree.path_through(interior).unwrap();
        let mv = exchange_key_path(&tree, id, &mut reconnector).unwrap();
        assert_eq!(mv.gain(), 25);
        assert_eq!(mv.change.added_edges, vec![shortcut]);
        assert_eq!(mv.change.removed_edges.len(), 3);
        assert!(reconnector.searched() < 20);
        assert!(reconnector.searched() * 10 < tree.num_vertices());
    }
}

#[test]
fn test_insertion_only_touches_the_spanned_subtree() {
    // Outside vertex N joins terminals 0, 2 and 4 of a long path.
    let mut edges: Vec<(usize, usize, u64)> = (0..N - 1).map(|i| (i, i + 1, 10)).collect();
    edges.extend([(N, 0, 3), (N, 2, 3), (N, 4, 3)]);
    let graph = Graph::new(N + 1, edges, vec![0, 2, 4, N - 1]).unwrap();
    let tree = TreeState::new(&graph, &(0..N - 1).collect::<Vec<_>>()).unwrap();

    let mut insertion = Insertion::new(&graph);
    let mv = insertion.insert(&tree, N, 3).unwrap();
    assert_eq!(mv.gain(), 31);
    assert_eq!(mv.change.removed_edges, vec![0, 1, 2, 3]);
    assert_eq!(mv.change.added_edges, vec![N - 1, N, N + 1]);
    assert_eq!(mv.change.touched, vec![0, 1, 2, 3, 4, N]);

    assert!(insertion.insert(&tree, N, 4).is_none());
}
