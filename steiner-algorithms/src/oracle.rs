use crate::NONE;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use steiner_challenge::{Graph, Weight, INFINITY};

/// Multi-source shortest-path labels: for every reached vertex, the source
/// it is closest to (its base), the distance to that base and the edge
/// towards it.
///
/// Arrays are sized once and reset lazily through an epoch stamp, so a
/// search only pays for the vertices it actually reaches. This lets the
/// neighborhood evaluators run thousands of small bounded searches per scan
/// without touching the whole graph.
#[derive(Debug, Clone)]
pub struct Voronoi {
    epoch: u32,
    reached: Vec<u32>,
    settled: Vec<u32>,
    target: Vec<u32>,
    dist: Vec<Weight>,
    base: Vec<usize>,
    pred: Vec<usize>,
    order: Vec<usize>,
    heap: BinaryHeap<Reverse<(Weight, usize)>>,
}

impl Voronoi {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            epoch: 0,
            reached: vec![0; num_nodes],
            settled: vec![0; num_nodes],
            target: vec![0; num_nodes],
            dist: vec![INFINITY; num_nodes],
            base: vec![NONE; num_nodes],
            pred: vec![NONE; num_nodes],
            order: Vec::new(),
            heap: BinaryHeap::new(),
        }
    }

    /// Unbounded partition of all vertices by nearest source.
    pub fn compute(graph: &Graph, sources: &[usize]) -> Self {
        let mut voronoi = Self::new(graph.num_nodes);
        voronoi.run(graph, sources, |_| true, INFINITY, &[]);
        voronoi
    }

    fn next_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.reached.iter_mut().for_each(|s| *s = 0);
            self.settled.iter_mut().for_each(|s| *s = 0);
            self.target.iter_mut().for_each(|s| *s = 0);
            self.epoch = 1;
        }
        self.order.clear();
        self.heap.clear();
    }

    /// Dijkstra seeded from every vertex of `sources` at distance zero.
    ///
    /// Non-source vertices are entered only when `passable` accepts them,
    /// and no label above `bound` is ever recorded. When `targets` is not
    /// empty the search stops as soon as all of them are settled.
    pub fn run<P>(
        &mut self,
        graph: &Graph,
        sources: &[usize],
        passable: P,
        bound: Weight,
        targets: &[usize],
    ) where
        P: Fn(usize) -> bool,
    {
        self.next_epoch();
        let epoch = self.epoch;

        let mut remaining = 0;
        for &t in targets {
            if self.target[t] != epoch {
                self.target[t] = epoch;
                remaining += 1;
            }
        }

        for &s in sources {
            if self.reached[s] == epoch {
                continue;
            }
            self.reached[s] = epoch;
            self.dist[s] = 0;
            self.base[s] = s;
            self.pred[s] = NONE;
            self.heap.push(Reverse((0, s)));
        }

        while let Some(Reverse((d, x))) = self.heap.pop() {
            if self.settled[x] == epoch || d > self.dist[x] {
                continue;
            }
            self.settled[x] = epoch;
            self.order.push(x);

            if self.target[x] == epoch {
                remaining -= 1;
                if remaining == 0 {
                    break;
                }
            }

            for &(y, e) in graph.neighbors(x) {
                let nd = d.saturating_add(graph.weight(e));
                if nd > bound {
                    continue;
                }
                if self.reached[y] == epoch {
                    if self.settled[y] == epoch || self.dist[y] <= nd {
                        continue;
                    }
                } else if !passable(y) {
                    continue;
                }
                self.reached[y] = epoch;
                self.dist[y] = nd;
                self.base[y] = self.base[x];
                self.pred[y] = e;
                self.heap.push(Reverse((nd, y)));
            }
        }
    }

    /// True once `v` holds its final label in the latest run.
    #[inline]
    pub fn is_settled(&self, v: usize) -> bool {
        self.settled[v] == self.epoch
    }

    #[inline]
    pub fn dist(&self, v: usize) -> Weight {
        if self.is_settled(v) {
            self.dist[v]
        } else {
            INFINITY
        }
    }

    #[inline]
    pub fn base(&self, v: usize) -> Option<usize> {
        self.is_settled(v).then(|| self.base[v])
    }

    /// Settled vertices in non-decreasing distance order.
    #[inline]
    pub fn settled(&self) -> &[usize] {
        &self.order
    }

    /// Appends the edges on the path from `v` back to its base.
    pub fn push_path_edges(&self, graph: &Graph, mut v: usize, out: &mut Vec<usize>) {
        while self.is_settled(v) && self.pred[v] != NONE {
            let e = self.pred[v];
            out.push(e);
            v = graph.edge(e).other(v);
        }
    }

    pub fn path_edges(&self, graph: &Graph, v: usize) -> Vec<usize> {
        let mut edges = Vec::new();
        self.push_path_edges(graph, v, &mut edges);
        edges
    }
}

/// A cheapest boundary edge between two adjacent nearest-terminal regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkLink {
    pub a: usize,
    pub b: usize,
    pub cost: Weight,
    pub edge: usize,
}

/// Nearest-terminal partition plus, for small terminal sets, the exact
/// pairwise terminal distances.
///
/// Computed once per solve and read-only afterwards.
pub struct DistanceOracle {
    partition: Voronoi,
    terminal_index: Vec<usize>,
    pairwise: Option<Vec<Vec<Weight>>>,
}

impl DistanceOracle {
    /// Pairwise distances are only materialized when the graph has at most
    /// `dense_limit` terminals; one targeted search per terminal is run.
    pub fn new(graph: &Graph, dense_limit: usize) -> Self {
        let partition = Voronoi::compute(graph, &graph.terminals);

        let mut terminal_index = vec![NONE; graph.num_nodes];
        for (i, &t) in graph.terminals.iter().enumerate() {
            terminal_index[t] = i;
        }

        let pairwise = (graph.num_terminals() <= dense_limit).then(|| {
            let mut search = Voronoi::new(graph.num_nodes);
            graph
                .terminals
                .iter()
                .map(|&t| {
                    search.run(graph, &[t], |_| true, INFINITY, &graph.terminals);
                    graph.terminals.iter().map(|&s| search.dist(s)).collect::<Vec<Weight>>()
                })
                .collect::<Vec<Vec<Weight>>>()
        });

        Self {
            partition,
            terminal_index,
            pairwise,
        }
    }

    #[inline]
    pub fn partition(&self) -> &Voronoi {
        &self.partition
    }

    /// Nearest terminal of `v` and its distance, `None` when no terminal
    /// reaches `v`.
    pub fn nearest_terminal(&self, v: usize) -> Option<(usize, Weight)> {
        self.partition
            .base(v)
            .map(|base| (base, self.partition.dist(v)))
    }

    #[inline]
    pub fn has_pairwise(&self) -> bool {
        self.pairwise.is_some()
    }

    /// Shortest distance between terminals `a` and `b` (vertex ids).
    ///
    /// `None` when pairwise distances were not materialized; `INFINITY`
    /// when the two terminals are not connected.
    pub fn terminal_distance(&self, a: usize, b: usize) -> Option<Weight> {
        let pairwise = self.pairwise.as_ref()?;
        let (i, j) = (self.terminal_index[a], self.terminal_index[b]);
        if i == NONE || j == NONE {
            return None;
        }
        Some(pairwise[i][j])
    }

    /// Cheapest boundary edge for every pair of adjacent terminal regions,
    /// sorted by `(cost, edge)`.
    ///
    /// An MST of this network is an MST of the complete distance network
    /// over the terminals, which is what lets the distance-network
    /// heuristic skip the quadratic pairwise computation.
    pub fn boundary_network(&self, graph: &Graph) -> Vec<NetworkLink> {
        let mut best: crate::HashMap<(usize, usize), NetworkLink> = crate::HashMap::default();
        for (e, edge) in graph.edges.iter().enumerate() {
            let (Some(bu), Some(bv)) = (self.partition.base(edge.u), self.partition.base(edge.v))
            else {
                continue;
            };
            if bu == bv {
                continue;
            }
            let cost = self.partition.dist(edge.u) + edge.weight + self.partition.dist(edge.v);
            let key = (bu.min(bv), bu.max(bv));
            let link = NetworkLink {
                a: key.0,
                b: key.1,
                cost,
                edge: e,
            };
            best.entry(key)
                .and_modify(|current| {
                    if (cost, e) < (current.cost, current.edge) {
                        *current = link;
                    }
                })
                .or_insert(link);
        }
        let mut links: Vec<NetworkLink> = best.into_values().collect();
        links.sort_unstable_by_key(|l| (l.cost, l.edge));
        links
    }

    /// Graph edges realizing `link`: both region paths plus the boundary edge.
    pub fn link_path(&self, graph: &Graph, link: &NetworkLink) -> Vec<usize> {
        let edge = graph.edge(link.edge);
        let mut edges = vec![link.edge];
        self.partition.push_path_edges(graph, edge.u, &mut edges);
        self.partition.push_path_edges(graph, edge.v, &mut edges);
        edges
    }
}
