use crate::graph::{Graph, Weight};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// A Steiner tree given by its edge list.
///
/// Vertex ids are the graph's 0-based ids. A single-terminal instance is
/// solved by the empty edge list.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution {
    pub edges: Vec<(usize, usize)>,
}

impl Solution {
    pub fn new() -> Self {
        Self { edges: Vec::new() }
    }

    pub fn from_edge_ids(graph: &Graph, ids: impl IntoIterator<Item = usize>) -> Self {
        let mut edges: Vec<(usize, usize)> = ids
            .into_iter()
            .map(|e| {
                let edge = graph.edge(e);
                (edge.u.min(edge.v), edge.u.max(edge.v))
            })
            .collect();
        edges.sort_unstable();
        Self { edges }
    }

    /// Vertices touched by the solution, plus the terminals of `graph`.
    pub fn vertices(&self, graph: &Graph) -> Vec<usize> {
        let mut seen = HashSet::new();
        for &(u, v) in &self.edges {
            seen.insert(u);
            seen.insert(v);
        }
        seen.extend(graph.terminals.iter().copied());
        let mut vertices: Vec<usize> = seen.into_iter().collect();
        vertices.sort_unstable();
        vertices
    }
}

impl Graph {
    /// Checks that `solution` is a Steiner tree of this graph and returns
    /// its weight. Parallel edges are charged at their lightest weight.
    pub fn evaluate_solution(&self, solution: &Solution) -> Result<Weight> {
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); self.num_nodes];
        let mut seen_edges = HashSet::with_capacity(solution.edges.len());
        let mut total: Weight = 0;
        for &(u, v) in &solution.edges {
            let e = self
                .edge_between(u, v)
                .ok_or_else(|| anyhow!("Edge ({}, {}) does not exist in the graph", u, v))?;
            if !seen_edges.insert((u.min(v), u.max(v))) {
                return Err(anyhow!("Edge ({}, {}) appears more than once", u, v));
            }
            total += self.weight(e);
            adjacency[u].push(v);
            adjacency[v].push(u);
        }

        let vertices = solution.vertices(self);
        if solution.edges.len() + 1 != vertices.len() {
            return Err(anyhow!(
                "Solution with {} vertices and {} edges is not a tree",
                vertices.len(),
                solution.edges.len()
            ));
        }

        let root = self.terminals[0];
        let mut visited = vec![false; self.num_nodes];
        let mut queue = VecDeque::from([root]);
        visited[root] = true;
        let mut reached = 1;
        while let Some(x) = queue.pop_front() {
            for &y in &adjacency[x] {
                if !visited[y] {
                    visited[y] = true;
                    reached += 1;
                    queue.push_back(y);
                }
            }
        }
        if reached != vertices.len() {
            return Err(anyhow!(
                "Solution is disconnected ({} of {} vertices reachable from terminal {})",
                reached,
                vertices.len(),
                root
            ));
        }

        for &v in &vertices {
            if !self.is_terminal(v) && adjacency[v].len() < 2 {
                return Err(anyhow!(
                    "Non-terminal vertex {} is a leaf of the solution",
                    v
                ));
            }
        }

        Ok(total)
    }

    pub fn verify_solution(&self, solution: &Solution) -> Result<()> {
        self.evaluate_solution(solution).map(|_| ())
    }
}
