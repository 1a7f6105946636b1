use super::reconnect::{Passage, Reconnector};
use super::{Move, MoveKind};
use crate::mst::kruskal;
use crate::tree::TreeState;
use crate::{HashMap, HashSet};
use steiner_challenge::{Graph, Weight};

/// Where a tree vertex sits in the key-path decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Location {
    Key(usize),
    Path(usize),
}

/// Scratch space for evaluating the insertion of an outside vertex.
pub struct Insertion {
    stamp: u32,
    spanned: Vec<u32>,
}

impl Insertion {
    pub fn new(graph: &Graph) -> Self {
        Self {
            stamp: 0,
            spanned: vec![0; graph.num_nodes],
        }
    }

    fn next_stamp(&mut self) -> u32 {
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.spanned.iter_mut().for_each(|s| *s = 0);
            self.stamp = 1;
        }
        self.stamp
    }

    /// Adds the outside vertex `u` through its direct edges to the tree and
    /// drops the tree segments that become redundant.
    ///
    /// Only the subtree spanning the attachment points can lose edges; it is
    /// found by climbing parent edges, so the work stays within it. It is
    /// cut into segments at key vertices, attachment points and branchings;
    /// a Kruskal pass over those segments and the new edges decides which
    /// ones are kept.
    pub fn insert(&mut self, tree: &TreeState, u: usize, min_attachments: usize) -> Option<Move> {
        if tree.contains(u) {
            return None;
        }
        let graph = tree.graph();

        let mut attachments: Vec<(usize, Weight, usize)> = graph
            .neighbors(u)
            .iter()
            .filter(|&&(w, _)| tree.contains(w))
            .map(|&(w, e)| (w, graph.weight(e), e))
            .collect();
        attachments.sort_unstable();
        attachments.dedup_by_key(|a| a.0);

        let locations: HashSet<Location> = attachments
            .iter()
            .map(|&(w, _, _)| match tree.path_through(w) {
                Some(id) if !tree.is_key(w) => Location::Path(id),
                _ => Location::Key(w),
            })
            .collect();
        if locations.len() < min_attachments.max(3) {
            return None;
        }

        // Subtree spanning the attachments: every attachment climbs towards
        // their common ancestor until it meets an earlier climb.
        let stamp = self.next_stamp();
        let top = attachments
            .iter()
            .map(|a| a.0)
            .reduce(|a, b| tree.meet(a, b))?;
        let mut span_edges: HashSet<usize> = HashSet::default();
        let mut span_degree: HashMap<usize, usize> = HashMap::default();
        for &(w, _, _) in &attachments {
            let mut x = w;
            while x != top && self.spanned[x] != stamp {
                self.spanned[x] = stamp;
                let Some(e) = tree.parent_edge(x) else {
                    break;
                };
                span_edges.insert(e);
                *span_degree.entry(x).or_default() += 1;
                x = graph.edge(e).other(x);
                *span_degree.entry(x).or_default() += 1;
            }
        }

        let attached: HashSet<usize> = attachments.iter().map(|a| a.0).collect();
        let is_node = |x: usize| {
            attached.contains(&x)
                || tree.is_key(x)
                || span_degree.get(&x).copied().unwrap_or(0) != 2
        };

        let mut index: HashMap<usize, usize> = HashMap::default();
        let mut segments: Vec<(Weight, Vec<usize>)> = Vec::new();
        let mut links: Vec<(Weight, usize, usize, usize)> = Vec::new();
        let mut walked: HashSet<usize> = HashSet::default();
        let mut nodes: Vec<usize> = span_degree.keys().copied().filter(|&x| is_node(x)).collect();
        nodes.sort_unstable();
        for (i, &x) in nodes.iter().enumerate() {
            index.insert(x, i + 1);
        }
        for &x in &nodes {
            for &first in tree.incident(x) {
                if !span_edges.contains(&first) || walked.contains(&first) {
                    continue;
                }
                let (mut current, mut edge) = (x, first);
                let mut edges = Vec::new();
                let mut weight = 0;
                let end = loop {
                    walked.insert(edge);
                    edges.push(edge);
                    weight += graph.weight(edge);
                    let next = graph.edge(edge).other(current);
                    if is_node(next) {
                        break next;
                    }
                    let onward = tree
                        .incident(next)
                        .iter()
                        .copied()
                        .find(|&f| f != edge && span_edges.contains(&f))?;
                    current = next;
                    edge = onward;
                };
                links.push((weight, index[&x], index[&end], segments.len()));
                segments.push((weight, edges));
            }
        }

        let offset = segments.len();
        for (k, &(w, weight, _)) in attachments.iter().enumerate() {
            links.push((weight, 0, index[&w], offset + k));
        }
        let kept: HashSet<usize> = kruskal(nodes.len() + 1, links).into_iter().collect();

        let removed: Vec<usize> = segments
            .iter()
            .enumerate()
            .filter(|(s, _)| !kept.contains(s))
            .flat_map(|(_, (_, edges))| edges.iter().copied())
            .collect();
        let added: Vec<usize> = attachments
            .iter()
            .enumerate()
            .filter(|(k, _)| kept.contains(&(offset + k)))
            .map(|(_, &(_, _, e))| e)
            .collect();
        if removed.is_empty() || added.len() < 2 {
            return None;
        }

        let change = tree.settle(&removed, &added)?;
        change.is_improving().then_some(Move {
            kind: MoveKind::SteinerVertexInsertion,
            anchor: u,
            change,
        })
    }
}

/// Removes the non-terminal tree vertex `v` and reconnects its neighbours'
/// components with direct edges between remaining tree vertices.
pub fn eliminate_steiner_vertex(
    tree: &TreeState,
    v: usize,
    reconnector: &mut Reconnector,
) -> Option<Move> {
    if !tree.contains(v) || tree.graph().is_terminal(v) {
        return None;
    }
    let removed_edges = tree.incident(v).to_vec();
    let budget = tree.graph().total_weight(&removed_edges);
    let added = reconnector.reconnect(
        tree,
        &[v],
        &removed_edges,
        Passage::TreeOnly,
        budget,
    )?;
    let change = tree.settle(&removed_edges, &added)?;
    change.is_improving().then_some(Move {
        kind: MoveKind::SteinerVertexElimination,
        anchor: v,
        change,
    })
}
