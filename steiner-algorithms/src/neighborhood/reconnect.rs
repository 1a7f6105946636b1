use crate::mst::UnionFind;
use crate::oracle::Voronoi;
use crate::tree::TreeState;
use crate::NONE;
use steiner_challenge::{Graph, Weight};

/// Which vertices a reconnecting path may pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Passage {
    /// Any vertex outside the remaining tree.
    Free,
    /// None: components are joined by direct graph edges only.
    TreeOnly,
}

/// Rejoins the components a tree falls into after a connected region of
/// its vertices and edges is removed.
///
/// Components are told apart through the rooted order of the tree: every
/// removed edge cuts off the subtree of its lower endpoint, and everything
/// else stays with the root. Only tree vertices within `budget` of the
/// removed region seed the nearest-component search; boundary edges between
/// differently labelled regions are the candidate links, and a Kruskal pass
/// over component labels picks the cheapest set.
pub struct Reconnector {
    search: Voronoi,
    label: Vec<usize>,
    labelled: Vec<usize>,
    cut: Vec<usize>,
    removed_vertex: Vec<bool>,
    removed_edge: Vec<bool>,
    searched: usize,
}

impl Reconnector {
    pub fn new(graph: &Graph) -> Self {
        Self {
            search: Voronoi::new(graph.num_nodes),
            label: vec![NONE; graph.num_nodes],
            labelled: Vec::new(),
            cut: Vec::new(),
            removed_vertex: vec![false; graph.num_nodes],
            removed_edge: vec![false; graph.num_edges()],
            searched: 0,
        }
    }

    /// Vertices settled by the searches of the latest call to
    /// [`Reconnector::reconnect`].
    #[inline]
    pub fn searched(&self) -> usize {
        self.searched
    }

    /// Edges joining the components left once `removed_vertices` and
    /// `removed_edges` leave the tree, at a total cost strictly below
    /// `budget`. The removed region must be connected and must not hold the
    /// root.
    ///
    /// Returns `None` as soon as a lower bound on the connection cost
    /// reaches `budget`, or when the components cannot all be joined.
    pub fn reconnect(
        &mut self,
        tree: &TreeState,
        removed_vertices: &[usize],
        removed_edges: &[usize],
        passage: Passage,
        budget: Weight,
    ) -> Option<Vec<usize>> {
        for &v in removed_vertices {
            self.removed_vertex[v] = true;
        }
        for &e in removed_edges {
            self.removed_edge[e] = true;
        }
        self.searched = 0;
        let result = self.join(tree, removed_vertices, removed_edges, passage, budget);
        for &v in removed_vertices {
            self.removed_vertex[v] = false;
        }
        for &e in removed_edges {
            self.removed_edge[e] = false;
        }
        for &v in &self.labelled {
            self.label[v] = NONE;
        }
        self.labelled.clear();
        self.cut.clear();
        result
    }

    fn join(
        &mut self,
        tree: &TreeState,
        removed_vertices: &[usize],
        removed_edges: &[usize],
        passage: Passage,
        budget: Weight,
    ) -> Option<Vec<usize>> {
        let graph = tree.graph();
        if self.removed_vertex[tree.root()] {
            return None;
        }

        let mut region: Vec<usize> = removed_vertices.to_vec();
        for &e in removed_edges {
            let edge = graph.edge(e);
            region.push(edge.u);
            region.push(edge.v);
            let lower = if tree.parent_edge(edge.u) == Some(e) {
                edge.u
            } else {
                edge.v
            };
            if !self.removed_vertex[lower] {
                self.cut.push(lower);
            }
        }
        self.cut.sort_unstable();
        self.cut.dedup();
        let components = self.cut.len() + 1;
        if components < 2 {
            return Some(Vec::new());
        }

        // Remaining tree vertices near the removed region.
        self.search.run(graph, &region, |_| true, budget, &[]);
        self.searched += self.search.settled().len();
        let mut sources = Vec::new();
        for &x in self.search.settled() {
            if !tree.contains(x) || self.removed_vertex[x] {
                continue;
            }
            self.label[x] = side(tree, &self.cut, x);
            self.labelled.push(x);
            sources.push(x);
        }

        let removed_vertex = &self.removed_vertex;
        self.search.run(
            graph,
            &sources,
            |y| match passage {
                Passage::Free => !tree.contains(y) || removed_vertex[y],
                Passage::TreeOnly => false,
            },
            budget,
            &[],
        );
        self.searched += self.search.settled().len();
        let mut links: Vec<(Weight, usize, usize, usize)> = Vec::new();
        for &x in self.search.settled() {
            let Some(bx) = self.search.base(x) else {
                continue;
            };
            for &(y, e) in graph.neighbors(x) {
                if y < x || (tree.has_edge(e) && !self.removed_edge[e]) {
                    continue;
                }
                let Some(by) = self.search.base(y) else {
                    continue;
                };
                let (lx, ly) = (self.label[bx], self.label[by]);
                if lx == ly {
                    continue;
                }
                let cost = self
                    .search
                    .dist(x)
                    .saturating_add(graph.weight(e))
                    .saturating_add(self.search.dist(y));
                if cost < budget {
                    links.push((cost, lx, ly, e));
                }
            }
        }
        links.sort_unstable_by_key(|&(cost, _, _, e)| (cost, e));

        let mut uf = UnionFind::new(components);
        let mut spent: Weight = 0;
        let mut chosen = Vec::with_capacity(components - 1);
        for (cost, lx, ly, e) in links {
            // Every remaining link costs at least `cost`.
            let needed = (components - 1 - chosen.len()) as Weight;
            if spent.saturating_add(cost.saturating_mul(needed)) >= budget {
                return None;
            }
            if uf.union(lx, ly) {
                spent += cost;
                chosen.push(e);
                if uf.components() == 1 {
                    break;
                }
            }
        }
        if uf.components() != 1 {
            return None;
        }

        let mut added = Vec::new();
        for e in chosen {
            let edge = graph.edge(e);
            added.push(e);
            self.search.push_path_edges(graph, edge.u, &mut added);
            self.search.push_path_edges(graph, edge.v, &mut added);
        }
        added.sort_unstable();
        added.dedup();
        Some(added)
    }
}

/// Component label of the remaining tree vertex `x`: the index of the cut
/// subtree holding it plus one, or 0 for the part still attached to the
/// root.
fn side(tree: &TreeState, cut: &[usize], x: usize) -> usize {
    cut.iter()
        .position(|&c| tree.is_ancestor(c, x))
        .map_or(0, |i| i + 1)
}
