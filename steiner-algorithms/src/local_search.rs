use crate::cancel::Cancellation;
use crate::neighborhood::{Evaluator, Move};
use crate::params::{Params, Selection};
use crate::tree::TreeState;
use log::{debug, info, trace};
use serde::Serialize;
use std::time::Instant;
use steiner_challenge::{Solution, Weight};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    ApplyingMove,
    Terminated,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A full scan found no improving move.
    LocalOptimum,
    /// The tolerated number of non-improving partial scans was reached.
    EarlyStop,
    /// The cancellation token expired.
    Cancelled,
}

#[derive(Serialize, Debug, Clone)]
pub struct SearchOutcome {
    pub solution: Solution,
    pub weight: Weight,
    pub start_weight: Weight,
    /// Tree weight before the first move and after each applied move.
    pub weights: Vec<Weight>,
    /// Seconds spent on each improving iteration (scan and apply).
    pub epoch_times: Vec<f64>,
    pub iterations: usize,
    pub scans: usize,
    pub run_time: f64,
    pub termination: Termination,
}

/// Improves a tree by applying one improving move per iteration.
///
/// Each scan only visits the dirty vertices: every vertex of the tree at
/// first, then the region around the last applied move. A scan over the
/// dirty set that finds nothing is followed by a full rescan, unless early
/// stopping is enabled and its patience is exhausted.
pub struct LocalSearch<'a> {
    tree: TreeState<'a>,
    params: Params,
    evaluator: Evaluator,
    phase: Phase,
    dirty: Vec<usize>,
}

impl<'a> LocalSearch<'a> {
    pub fn new(tree: TreeState<'a>, params: &Params) -> Self {
        let evaluator = Evaluator::new(tree.graph(), params);
        Self {
            tree,
            params: params.clone(),
            evaluator,
            phase: Phase::Idle,
            dirty: Vec::new(),
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn tree(&self) -> &TreeState<'a> {
        &self.tree
    }

    pub fn into_tree(self) -> TreeState<'a> {
        self.tree
    }

    pub fn run(&mut self, cancel: &dyn Cancellation) -> SearchOutcome {
        let t0 = Instant::now();
        let start_weight = self.tree.weight();
        let mut weights = vec![start_weight];
        let mut epoch_times = Vec::new();
        let mut scans = 0;
        let mut idle = 0;
        let mut full_scan = true;
        self.dirty = self.tree.vertices();

        let termination = loop {
            self.phase = Phase::Idle;
            if self.params.neighborhoods.is_empty() {
                break Termination::LocalOptimum;
            }
            if cancel.expired() {
                break Termination::Cancelled;
            }

            let epoch_start = Instant::now();
            self.phase = Phase::Scanning;
            scans += 1;
            match self.scan() {
                Some(mv) => {
                    self.phase = Phase::ApplyingMove;
                    let mut dirty = self.tree.apply(&mv.change);
                    dirty.extend_from_slice(&mv.change.removed_vertices);
                    dirty.sort_unstable();
                    dirty.dedup();
                    debug!(
                        "{:?} at {}: gain {}, weight {} ({} dirty vertices)",
                        mv.kind,
                        mv.anchor,
                        mv.gain(),
                        self.tree.weight(),
                        dirty.len()
                    );
                    debug_assert!(self.tree.validate().is_ok());
                    self.dirty = dirty;
                    weights.push(self.tree.weight());
                    epoch_times.push(epoch_start.elapsed().as_secs_f64());
                    idle = 0;
                    full_scan = false;
                }
                None if full_scan => break Termination::LocalOptimum,
                None => {
                    idle += 1;
                    if self.params.early_stop && idle >= self.params.patience.max(1) {
                        break Termination::EarlyStop;
                    }
                    self.dirty = self.tree.vertices();
                    full_scan = true;
                }
            }
        };
        self.phase = Phase::Terminated;

        let run_time = t0.elapsed().as_secs_f64();
        info!(
            "{:?} after {} moves and {} scans: weight {} -> {} in {:.3}s",
            termination,
            weights.len() - 1,
            scans,
            start_weight,
            self.tree.weight(),
            run_time
        );
        SearchOutcome {
            solution: self.tree.to_solution(),
            weight: self.tree.weight(),
            start_weight,
            iterations: weights.len() - 1,
            weights,
            epoch_times,
            scans,
            run_time,
            termination,
        }
    }

    fn scan(&mut self) -> Option<Move> {
        self.evaluator.begin_scan();
        let mut best: Option<Move> = None;
        let mut candidates = Vec::new();
        let mut evaluated = 0;
        'scan: for &v in &self.dirty {
            for &neighborhood in &self.params.neighborhoods {
                self.evaluator
                    .candidates(&self.tree, v, neighborhood, &mut candidates);
                for mv in candidates.drain(..) {
                    evaluated += 1;
                    if best.as_ref().map_or(true, |b| mv.beats(b)) {
                        best = Some(mv);
                    }
                }
                if self.params.selection == Selection::First && best.is_some() {
                    break 'scan;
                }
            }
        }
        trace!(
            "Scanned {} dirty vertices: {} improving candidates, best gain {:?}",
            self.dirty.len(),
            evaluated,
            best.as_ref().map(|mv| mv.gain())
        );
        best
    }
}
