use crate::graph::{Graph, Weight};
use anyhow::{anyhow, Result};
use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Shape of a generated instance.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Track {
    pub num_nodes: usize,
    pub num_terminals: usize,
    /// Edges added on top of the random spanning tree, per vertex.
    pub extra_edges_per_node: usize,
    pub max_weight: Weight,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            num_nodes: 200,
            num_terminals: 20,
            extra_edges_per_node: 2,
            max_weight: 100,
        }
    }
}

impl Graph {
    /// Builds a connected random instance. The same seed and track always
    /// produce the same graph.
    pub fn generate_instance(seed: &[u8; 32], track: &Track) -> Result<Self> {
        if track.num_nodes < 2 {
            return Err(anyhow!("num_nodes must be at least 2"));
        }
        if track.num_terminals == 0 || track.num_terminals > track.num_nodes {
            return Err(anyhow!(
                "num_terminals must be in 1..={} (got {})",
                track.num_nodes,
                track.num_terminals
            ));
        }
        if track.max_weight == 0 {
            return Err(anyhow!("max_weight must be positive"));
        }

        let mut rng = SmallRng::from_seed(*seed);
        let n = track.num_nodes;
        let mut pairs: HashSet<(usize, usize)> = HashSet::new();
        let mut edges = Vec::with_capacity(n * (1 + track.extra_edges_per_node));

        // Random spanning tree keeps the instance connected
        for v in 1..n {
            let u = rng.gen_range(0..v);
            pairs.insert((u, v));
            edges.push((u, v, rng.gen_range(1..=track.max_weight)));
        }

        let max_pairs = n * (n - 1) / 2;
        let target = (edges.len() + n * track.extra_edges_per_node).min(max_pairs);
        while edges.len() < target {
            let a = rng.gen_range(0..n);
            let b = rng.gen_range(0..n);
            if a == b {
                continue;
            }
            let key = (a.min(b), a.max(b));
            if !pairs.insert(key) {
                continue;
            }
            edges.push((key.0, key.1, rng.gen_range(1..=track.max_weight)));
        }

        let mut terminals: Vec<usize> = (0..n).collect();
        terminals.shuffle(&mut rng);
        terminals.truncate(track.num_terminals);
        Graph::new(n, edges, terminals)
    }
}
