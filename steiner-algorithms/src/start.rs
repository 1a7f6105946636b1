use crate::mst::{kruskal, UnionFind};
use crate::oracle::{DistanceOracle, Voronoi};
use crate::params::StartStrategy;
use crate::tree::TreeState;
use crate::NONE;
use anyhow::{anyhow, Result};
use log::info;
use steiner_challenge::{Graph, INFINITY};

/// Builds the starting tree. The distance oracle is only computed for the
/// distance-network heuristic, with pairwise distances up to `dense_limit`
/// terminals.
pub fn build(graph: &Graph, strategy: StartStrategy, dense_limit: usize) -> Result<TreeState<'_>> {
    let tree = match strategy {
        StartStrategy::Dnh => distance_network(graph, &DistanceOracle::new(graph, dense_limit))?,
        StartStrategy::Mst => spanning_tree(graph)?,
    };
    info!(
        "Starting tree ({:?}): weight {}, {} vertices, {} key paths",
        strategy,
        tree.weight(),
        tree.num_vertices(),
        tree.num_key_paths()
    );
    Ok(tree)
}

fn split_terminals(graph: &Graph, connected: usize) -> anyhow::Error {
    anyhow!(
        "Terminals are split across graph components: only {} of {} are connected",
        connected,
        graph.num_terminals()
    )
}

/// Distance-network heuristic.
///
/// Takes a minimum spanning tree of the terminal distance network, expands
/// its links into shortest paths, and keeps a minimum spanning tree of their
/// union. With pairwise distances available the network is the complete
/// one; otherwise the boundary network of the nearest-terminal partition is
/// used, which has the same minimum spanning tree weight.
pub fn distance_network<'a>(graph: &'a Graph, oracle: &DistanceOracle) -> Result<TreeState<'a>> {
    let t = graph.num_terminals();
    if t == 1 {
        return TreeState::new(graph, &[]);
    }

    let mut union: Vec<usize> = Vec::new();
    if oracle.has_pairwise() {
        let mut links = Vec::with_capacity(t * (t - 1) / 2);
        for i in 0..t {
            for j in i + 1..t {
                let d = oracle
                    .terminal_distance(graph.terminals[i], graph.terminals[j])
                    .unwrap_or(INFINITY);
                if d != INFINITY {
                    links.push((d, i, j, i * t + j));
                }
            }
        }
        let chosen = kruskal(t, links);
        if chosen.len() + 1 < t {
            return Err(split_terminals(graph, chosen.len() + 1));
        }

        let mut by_source: Vec<Vec<usize>> = vec![Vec::new(); t];
        for id in chosen {
            by_source[id / t].push(graph.terminals[id % t]);
        }
        let mut search = Voronoi::new(graph.num_nodes);
        for (i, targets) in by_source.iter().enumerate() {
            if targets.is_empty() {
                continue;
            }
            search.run(graph, &[graph.terminals[i]], |_| true, INFINITY, targets);
            for &target in targets {
                search.push_path_edges(graph, target, &mut union);
            }
        }
    } else {
        let mut index = vec![NONE; graph.num_nodes];
        for (i, &terminal) in graph.terminals.iter().enumerate() {
            index[terminal] = i;
        }
        let network = oracle.boundary_network(graph);
        let links = network
            .iter()
            .enumerate()
            .map(|(k, link)| (link.cost, index[link.a], index[link.b], k))
            .collect();
        let chosen = kruskal(t, links);
        if chosen.len() + 1 < t {
            return Err(split_terminals(graph, chosen.len() + 1));
        }
        for k in chosen {
            union.extend(oracle.link_path(graph, &network[k]));
        }
    }

    union.sort_unstable();
    union.dedup();
    let candidates = union
        .iter()
        .map(|&e| {
            let edge = graph.edge(e);
            (edge.weight, edge.u, edge.v, e)
        })
        .collect();
    TreeState::new(graph, &kruskal(graph.num_nodes, candidates))
}

/// Minimum spanning tree of the whole graph, restricted to the component
/// holding the terminals and pruned of non-terminal leaves.
pub fn spanning_tree(graph: &Graph) -> Result<TreeState<'_>> {
    let candidates = graph
        .edges
        .iter()
        .enumerate()
        .map(|(e, edge)| (edge.weight, edge.u, edge.v, e))
        .collect();
    let forest = kruskal(graph.num_nodes, candidates);

    let mut uf = UnionFind::new(graph.num_nodes);
    for &e in &forest {
        let edge = graph.edge(e);
        uf.union(edge.u, edge.v);
    }
    let root = uf.find(graph.terminals[0]);
    let connected = graph
        .terminals
        .iter()
        .filter(|&&terminal| uf.find(terminal) == root)
        .count();
    if connected != graph.num_terminals() {
        return Err(split_terminals(graph, connected));
    }

    let edges: Vec<usize> = forest
        .into_iter()
        .filter(|&e| uf.find(graph.edge(e).u) == root)
        .collect();
    TreeState::new(graph, &edges)
}
