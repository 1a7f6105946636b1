use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub type Weight = u64;

/// Distance label of a vertex that no search has reached.
pub const INFINITY: Weight = Weight::MAX;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Edge {
    pub u: usize,
    pub v: usize,
    pub weight: Weight,
}

impl Edge {
    #[inline]
    pub fn other(&self, x: usize) -> usize {
        if self.u == x {
            self.v
        } else {
            self.u
        }
    }
}

/// Undirected weighted graph with a designated terminal set.
///
/// Vertices are `0..num_nodes`. Every edge is stored once in `edges` and
/// referenced by index from both adjacency lists. The graph is immutable
/// once built; every solver component borrows it read-only.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Graph {
    pub num_nodes: usize,
    pub edges: Vec<Edge>,
    pub terminals: Vec<usize>,
    #[serde(skip)]
    adjacency: Vec<Vec<(usize, usize)>>,
    #[serde(skip)]
    is_terminal: Vec<bool>,
}

impl Graph {
    pub fn new(
        num_nodes: usize,
        edges: Vec<(usize, usize, Weight)>,
        terminals: Vec<usize>,
    ) -> Result<Self> {
        if num_nodes == 0 {
            return Err(anyhow!("Graph must contain at least one vertex"));
        }
        if terminals.is_empty() {
            return Err(anyhow!("Graph must contain at least one terminal"));
        }

        let mut adjacency = vec![Vec::new(); num_nodes];
        let mut stored = Vec::with_capacity(edges.len());
        for (i, &(u, v, weight)) in edges.iter().enumerate() {
            if u >= num_nodes || v >= num_nodes {
                return Err(anyhow!(
                    "Edge #{} ({}, {}) references a vertex outside 0..{}",
                    i,
                    u,
                    v,
                    num_nodes
                ));
            }
            if u == v {
                return Err(anyhow!("Edge #{} is a self loop on vertex {}", i, u));
            }
            adjacency[u].push((v, i));
            adjacency[v].push((u, i));
            stored.push(Edge { u, v, weight });
        }

        let mut is_terminal = vec![false; num_nodes];
        let mut unique_terminals = Vec::with_capacity(terminals.len());
        for &t in &terminals {
            if t >= num_nodes {
                return Err(anyhow!(
                    "Terminal {} is not a vertex of the graph (0..{})",
                    t,
                    num_nodes
                ));
            }
            if !is_terminal[t] {
                is_terminal[t] = true;
                unique_terminals.push(t);
            }
        }

        Ok(Self {
            num_nodes,
            edges: stored,
            terminals: unique_terminals,
            adjacency,
            is_terminal,
        })
    }

    /// Rebuilds the derived indexes, e.g. after deserialization.
    pub fn reindexed(self) -> Result<Self> {
        let edges = self.edges.iter().map(|e| (e.u, e.v, e.weight)).collect();
        Self::new(self.num_nodes, edges, self.terminals)
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn num_terminals(&self) -> usize {
        self.terminals.len()
    }

    #[inline]
    pub fn edge(&self, index: usize) -> &Edge {
        &self.edges[index]
    }

    #[inline]
    pub fn weight(&self, index: usize) -> Weight {
        self.edges[index].weight
    }

    /// `(neighbour, edge index)` pairs incident to `v`.
    #[inline]
    pub fn neighbors(&self, v: usize) -> &[(usize, usize)] {
        &self.adjacency[v]
    }

    #[inline]
    pub fn degree(&self, v: usize) -> usize {
        self.adjacency[v].len()
    }

    #[inline]
    pub fn is_terminal(&self, v: usize) -> bool {
        self.is_terminal[v]
    }

    /// Lightest edge joining `u` and `v`, if any.
    pub fn edge_between(&self, u: usize, v: usize) -> Option<usize> {
        if u >= self.num_nodes || v >= self.num_nodes {
            return None;
        }
        let (a, b) = if self.degree(u) <= self.degree(v) {
            (u, v)
        } else {
            (v, u)
        };
        self.adjacency[a]
            .iter()
            .filter(|&&(to, _)| to == b)
            .min_by_key(|&&(_, e)| (self.edges[e].weight, e))
            .map(|&(_, e)| e)
    }

    pub fn total_weight<'a>(&self, edges: impl IntoIterator<Item = &'a usize>) -> Weight {
        edges.into_iter().map(|&e| self.edges[e].weight).sum()
    }
}
