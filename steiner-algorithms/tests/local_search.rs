use serde_json::{json, Map, Value};
use steiner_algorithms::{
    solve, solve_challenge, Deadline, LocalSearch, Params, Phase, Selection,
    StopFlag, Termination, TreeState, Unbounded,
};
use steiner_challenge::{Graph, Track};

fn params(value: Value) -> Params {
    let map: Map<String, Value> = serde_json::from_value(value).unwrap();
    Params::initialize(&Some(map)).unwrap()
}

fn search(graph: &Graph, start_edges: &[usize], value: Value) -> (u64, Termination, usize) {
    let tree = TreeState::new(graph, start_edges).unwrap();
    let mut ls = LocalSearch::new(tree, &params(value));
    let outcome = ls.run(&Unbounded);
    assert_eq!(ls.phase(), Phase::Terminated);
    ls.tree().validate().unwrap();
    assert_eq!(graph.evaluate_solution(&outcome.solution).unwrap(), outcome.weight);
    (outcome.weight, outcome.termination, outcome.iterations)
}

#[test]
fn test_star_is_locally_optimal() {
    let graph = Graph::new(4, vec![(0, 3, 1), (1, 3, 1), (2, 3, 1)], vec![0, 1, 2]).unwrap();
    for start in ["dnh", "mst"] {
        let outcome = solve(
            &graph,
            &params(json!({"start": start, "neighborhoods": ["kv", "sv"]})),
            &Unbounded,
        )
        .unwrap();
        assert_eq!(outcome.weight, 3);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.scans, 1);
        assert_eq!(outcome.termination, Termination::LocalOptimum);
    }
}

#[test]
fn test_key_path_exchange() {
    // Terminals 0 and 1: tree path 0 - 2 - 1 (5 + 5), direct edge 0 - 1 (3).
    let graph = Graph::new(3, vec![(0, 2, 5), (2, 1, 5), (0, 1, 3)], vec![0, 1]).unwrap();
    let (weight, termination, iterations) = search(
        &graph,
        &[0, 1],
        json!({"neighborhoods": ["kv"], "early_stop": false}),
    );
    assert_eq!(weight, 3);
    assert_eq!(iterations, 1);
    assert_eq!(termination, Termination::LocalOptimum);
}

#[test]
fn test_key_vertex_elimination() {
    // Terminals 0, 1, 2 joined through Steiner vertex 3 (10 each) or 4 (2 each).
    let graph = Graph::new(
        5,
        vec![
            (0, 3, 10),
            (1, 3, 10),
            (2, 3, 10),
            (0, 4, 2),
            (1, 4, 2),
            (2, 4, 2),
        ],
        vec![0, 1, 2],
    )
    .unwrap();
    let tree = TreeState::new(&graph, &[0, 1, 2]).unwrap();
    let mut ls = LocalSearch::new(tree, &params(json!({"early_stop": false})));
    let outcome = ls.run(&Unbounded);
    assert_eq!(outcome.weights, vec![30, 6]);
    assert_eq!(outcome.iterations, 1);
    assert!(ls.tree().contains(4) && !ls.tree().contains(3));
}

#[test]
fn test_steiner_vertex_insertion() {
    // Terminal triangle with 5-edges; vertex 3 reaches each terminal at 2.
    let graph = Graph::new(
        4,
        vec![
            (0, 1, 5),
            (1, 2, 5),
            (0, 2, 5),
            (3, 0, 2),
            (3, 1, 2),
            (3, 2, 2),
        ],
        vec![0, 1, 2],
    )
    .unwrap();
    let (weight, termination, iterations) = search(
        &graph,
        &[0, 1],
        json!({"neighborhoods": ["sv"], "early_stop": false}),
    );
    assert_eq!(weight, 6);
    assert_eq!(iterations, 1);
    assert_eq!(termination, Termination::LocalOptimum);

    // Too few attachment points for the configured minimum.
    let (weight, _, iterations) = search(
        &graph,
        &[0, 1],
        json!({"neighborhoods": ["sv"], "sv_min_attachments": 4}),
    );
    assert_eq!(weight, 10);
    assert_eq!(iterations, 0);
}

#[test]
fn test_steiner_vertex_elimination() {
    let graph = Graph::new(3, vec![(0, 2, 5), (2, 1, 5), (0, 1, 3)], vec![0, 1]).unwrap();
    let (weight, _, iterations) = search(
        &graph,
        &[0, 1],
        json!({"neighborhoods": ["sv"], "early_stop": false}),
    );
    assert_eq!(weight, 3);
    assert_eq!(iterations, 1);
}

#[test]
fn test_best_gain_wins() {
    // Exchanging 0 - 2 - 1 saves 7 through edge 0 - 1; exchanging 1 - 3 - 4
    // saves 2 through edge 1 - 4.
    let graph = Graph::new(
        5,
        vec![
            (0, 2, 5),
            (2, 1, 5),
            (0, 1, 3),
            (1, 3, 2),
            (3, 4, 2),
            (1, 4, 2),
        ],
        vec![0, 1, 4],
    )
    .unwrap();
    let tree = TreeState::new(&graph, &[0, 1, 3, 4]).unwrap();
    let mut ls = LocalSearch::new(tree, &params(json!({"early_stop": false})));
    let outcome = ls.run(&Unbounded);
    assert_eq!(outcome.weights, vec![14, 7, 5]);
}

#[test]
fn test_cancellation() {
    let graph = Graph::new(3, vec![(0, 2, 5), (2, 1, 5), (0, 1, 3)], vec![0, 1]).unwrap();
    let flag = StopFlag::new();
    flag.raise();
    let tree = TreeState::new(&graph, &[0, 1]).unwrap();
    let outcome = LocalSearch::new(tree, &Params::default()).run(&flag);
    assert_eq!(outcome.termination, Termination::Cancelled);
    assert_eq!(outcome.iterations, 0);
    assert_eq!(outcome.scans, 0);
    assert_eq!(outcome.weight, 10);
    graph.verify_solution(&outcome.solution).unwrap();

    let expired = Deadline::after(std::time::Duration::ZERO);
    let tree = TreeState::new(&graph, &[0, 1]).unwrap();
    let outcome = LocalSearch::new(tree, &Params::default()).run(&expired);
    assert_eq!(outcome.termination, Termination::Cancelled);
    assert_eq!(outcome.weight, 10);
}

#[test]
fn test_no_neighborhoods_keeps_start() {
    let graph = Graph::new(3, vec![(0, 2, 5), (2, 1, 5), (0, 1, 3)], vec![0, 1]).unwrap();
    let (weight, termination, iterations) = search(&graph, &[0, 1], json!({"neighborhoods": []}));
    assert_eq!(weight, 10);
    assert_eq!(iterations, 0);
    assert_eq!(termination, Termination::LocalOptimum);
}

fn random_instances() -> Vec<Graph> {
    let track = Track {
        num_nodes: 150,
        num_terminals: 20,
        extra_edges_per_node: 3,
        max_weight: 40,
    };
    (0..4u8)
        .map(|seed| Graph::generate_instance(&[seed; 32], &track).unwrap())
        .collect()
}

#[test]
fn test_random_instances_stay_feasible_and_improve() {
    for graph in random_instances() {
        for start in ["dnh", "mst"] {
            for neighborhoods in [json!(["kv"]), json!(["sv"]), json!(["kv", "sv"])] {
                for selection in ["best", "first"] {
                    let params = params(json!({
                        "start": start,
                        "neighborhoods": neighborhoods,
                        "selection": selection,
                        "early_stop": false,
                    }));
                    let outcome = solve(&graph, &params, &Unbounded).unwrap();
                    assert_eq!(
                        graph.evaluate_solution(&outcome.solution).unwrap(),
                        outcome.weight
                    );
                    assert_eq!(outcome.termination, Termination::LocalOptimum);
                    assert_eq!(outcome.weights[0], outcome.start_weight);
                    assert_eq!(*outcome.weights.last().unwrap(), outcome.weight);
                    assert!(outcome.weights.windows(2).all(|w| w[1] < w[0]));
                    assert_eq!(outcome.epoch_times.len(), outcome.iterations);
                }
            }
        }
    }
}

#[test]
fn test_local_optimum_is_idempotent() {
    for graph in random_instances() {
        let params = params(json!({"start": "mst", "neighborhoods": ["kv", "sv"], "early_stop": false}));
        let outcome = solve(&graph, &params, &Unbounded).unwrap();
        let tree = TreeState::from_solution(&graph, &outcome.solution).unwrap();
        assert_eq!(tree.weight(), outcome.weight);

        let start = steiner_algorithms::start::spanning_tree(&graph).unwrap();
        let mut first = LocalSearch::new(start, &params);
        first.run(&Unbounded);
        let mut again = LocalSearch::new(first.into_tree(), &params);
        let rerun = again.run(&Unbounded);
        assert_eq!(rerun.iterations, 0);
        assert_eq!(rerun.solution, outcome.solution);
    }
}

#[test]
fn test_runs_are_deterministic() {
    let graph = &random_instances()[0];
    let params = params(json!({"neighborhoods": ["kv", "sv"], "early_stop": false}));
    let a = solve(graph, &params, &Unbounded).unwrap();
    let b = solve(graph, &params, &Unbounded).unwrap();
    assert_eq!(a.solution, b.solution);
    assert_eq!(a.weights, b.weights);
    assert_eq!(a.scans, b.scans);
}

#[test]
fn test_early_stop_never_runs_longer() {
    for graph in random_instances() {
        let full = solve(&graph, &params(json!({"early_stop": false})), &Unbounded).unwrap();
        let early = solve(&graph, &params(json!({"early_stop": true})), &Unbounded).unwrap();
        assert!(early.scans <= full.scans);
        assert_eq!(early.weights[0], full.weights[0]);
        assert_ne!(early.termination, Termination::Cancelled);
    }
}

#[test]
fn test_solve_challenge() {
    let graph = &random_instances()[1];
    let mut map = Map::new();
    map.insert("neighborhoods".to_string(), json!(["kv", "sv"]));
    map.insert("selection".to_string(), json!("first"));
    let solution = solve_challenge(graph, &Some(map)).unwrap().unwrap();
    graph.verify_solution(&solution).unwrap();
    assert_eq!(Params::default().selection, Selection::Best);
}
