pub mod key_vertex;
pub mod reconnect;
pub mod steiner_vertex;

use crate::params::{Neighborhood, Params};
use crate::tree::{Change, TreeState};
use crate::HashSet;
use reconnect::Reconnector;
use serde::Serialize;
use steiner_challenge::Graph;
use steiner_vertex::Insertion;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    KeyVertexElimination,
    KeyPathExchange,
    SteinerVertexInsertion,
    SteinerVertexElimination,
}

/// An improving candidate, already settled against the current tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub kind: MoveKind,
    /// The vertex the candidate was generated from.
    pub anchor: usize,
    pub change: Change,
}

impl Move {
    #[inline]
    pub fn gain(&self) -> i64 {
        self.change.gain
    }

    /// Number of vertices whose tree degree the move changes.
    #[inline]
    pub fn footprint(&self) -> usize {
        self.change.touched.len()
    }

    /// Larger gain wins; equal gains go to the smaller footprint.
    pub fn beats(&self, other: &Move) -> bool {
        (self.gain(), std::cmp::Reverse(self.footprint()))
            > (other.gain(), std::cmp::Reverse(other.footprint()))
    }
}

/// Generates the candidate moves anchored at one vertex for each active
/// neighborhood. Key paths and outside vertices reachable from several
/// anchors are evaluated once per scan.
pub struct Evaluator {
    reconnector: Reconnector,
    insertion: Insertion,
    min_attachments: usize,
    seen_paths: HashSet<usize>,
    seen_outside: HashSet<usize>,
}

impl Evaluator {
    pub fn new(graph: &Graph, params: &Params) -> Self {
        Self {
            reconnector: Reconnector::new(graph),
            insertion: Insertion::new(graph),
            min_attachments: params.sv_min_attachments,
            seen_paths: HashSet::default(),
            seen_outside: HashSet::default(),
        }
    }

    pub fn begin_scan(&mut self) {
        self.seen_paths.clear();
        self.seen_outside.clear();
    }

    pub fn candidates(
        &mut self,
        tree: &TreeState,
        v: usize,
        neighborhood: Neighborhood,
        out: &mut Vec<Move>,
    ) {
        match neighborhood {
            Neighborhood::KeyVertex => self.key_vertex_moves(tree, v, out),
            Neighborhood::SteinerVertex => self.steiner_vertex_moves(tree, v, out),
        }
    }

    fn key_vertex_moves(&mut self, tree: &TreeState, v: usize, out: &mut Vec<Move>) {
        if !tree.contains(v) {
            return;
        }
        out.extend(key_vertex::eliminate_key_vertex(
            tree,
            v,
            &mut self.reconnector,
        ));
        let paths = tree.paths_at(v).iter().copied().chain(tree.path_through(v));
        for id in paths {
            if self.seen_paths.insert(id) {
                out.extend(key_vertex::exchange_key_path(
                    tree,
                    id,
                    &mut self.reconnector,
                ));
            }
        }
    }

    fn steiner_vertex_moves(&mut self, tree: &TreeState, v: usize, out: &mut Vec<Move>) {
        if !tree.contains(v) {
            if self.seen_outside.insert(v) {
                out.extend(self.insertion.insert(tree, v, self.min_attachments));
            }
            return;
        }
        out.extend(steiner_vertex::eliminate_steiner_vertex(
            tree,
            v,
            &mut self.reconnector,
        ));
        for &(u, _) in tree.graph().neighbors(v) {
            if !tree.contains(u) && self.seen_outside.insert(u) {
                out.extend(self.insertion.insert(tree, u, self.min_attachments));
            }
        }
    }
}
