use crate::{HashMap, HashSet, NONE};
use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use steiner_challenge::{Graph, Solution, Weight};

/// Maximal tree path between two key vertices whose interior vertices all
/// have tree degree 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    /// From one key endpoint to the other.
    pub vertices: Vec<usize>,
    /// `edges[i]` joins `vertices[i]` and `vertices[i + 1]`.
    pub edges: Vec<usize>,
    pub weight: Weight,
}

impl KeyPath {
    #[inline]
    pub fn ends(&self) -> (usize, usize) {
        (self.vertices[0], self.vertices[self.vertices.len() - 1])
    }

    #[inline]
    pub fn interior(&self) -> &[usize] {
        &self.vertices[1..self.vertices.len() - 1]
    }

    #[inline]
    pub fn other_end(&self, v: usize) -> usize {
        let (a, b) = self.ends();
        if a == v {
            b
        } else {
            a
        }
    }
}

/// A fully settled structural change: applying it leaves a valid Steiner
/// tree whose weight is exactly `gain` lower.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Change {
    pub added_edges: Vec<usize>,
    pub removed_edges: Vec<usize>,
    pub added_vertices: Vec<usize>,
    pub removed_vertices: Vec<usize>,
    /// Vertices whose tree degree changes.
    pub touched: Vec<usize>,
    pub gain: i64,
}

impl Change {
    #[inline]
    pub fn is_improving(&self) -> bool {
        self.gain > 0
    }
}

/// The current solution: tree membership, degrees and the key-path
/// decomposition.
///
/// Key paths live in an arena and are indexed from their endpoints
/// (`ends_at`), their interior vertices (`interior_of`) and their edges
/// (`edge_path`). [`TreeState::apply`] only dissolves and re-traces the key
/// paths around the vertices a change touches.
///
/// The tree is also kept rooted at the first terminal, with parent edges,
/// depths and preorder intervals, so that subtree membership is a constant
/// time test.
pub struct TreeState<'a> {
    graph: &'a Graph,
    incident: Vec<Vec<usize>>,
    in_tree: Vec<bool>,
    num_edges: usize,
    weight: Weight,
    paths: Vec<Option<KeyPath>>,
    free: Vec<usize>,
    num_paths: usize,
    edge_path: Vec<usize>,
    interior_of: Vec<usize>,
    ends_at: Vec<Vec<usize>>,
    up: Vec<usize>,
    depth: Vec<usize>,
    enter: Vec<usize>,
    exit: Vec<usize>,
}

impl<'a> TreeState<'a> {
    /// Builds the state from a set of graph edges.
    ///
    /// The edges together with the terminals must form a tree; non-terminal
    /// leaves are pruned before the key paths are traced.
    pub fn new(graph: &'a Graph, edges: &[usize]) -> Result<Self> {
        let mut state = Self {
            graph,
            incident: vec![Vec::new(); graph.num_nodes],
            in_tree: vec![false; graph.num_edges()],
            num_edges: 0,
            weight: 0,
            paths: Vec::new(),
            free: Vec::new(),
            num_paths: 0,
            edge_path: vec![NONE; graph.num_edges()],
            interior_of: vec![NONE; graph.num_nodes],
            ends_at: vec![Vec::new(); graph.num_nodes],
            up: vec![NONE; graph.num_nodes],
            depth: vec![0; graph.num_nodes],
            enter: vec![0; graph.num_nodes],
            exit: vec![0; graph.num_nodes],
        };

        for &e in edges {
            if e >= graph.num_edges() {
                return Err(anyhow!("Edge index {} is out of range", e));
            }
            if !state.in_tree[e] {
                state.attach_edge(e);
            }
        }

        let members: Vec<usize> = (0..graph.num_nodes).filter(|&v| state.contains(v)).collect();
        if state.num_edges + 1 != members.len() {
            return Err(anyhow!(
                "{} edges over {} vertices do not form a tree",
                state.num_edges,
                members.len()
            ));
        }
        let reached = state.reachable_from(graph.terminals[0]);
        if reached != members.len() {
            return Err(anyhow!(
                "Tree is disconnected: {} of {} vertices reachable from terminal {}",
                reached,
                members.len(),
                graph.terminals[0]
            ));
        }

        let mut pruned = Vec::new();
        let mut seeds = Vec::new();
        state.prune_from(members.iter().copied(), &mut pruned, &mut seeds);
        let keys: Vec<usize> = members.into_iter().filter(|&v| state.is_key(v)).collect();
        state.rebuild_paths(&keys);
        state.order_from_root();
        Ok(state)
    }

    pub fn from_solution(graph: &'a Graph, solution: &Solution) -> Result<Self> {
        let edges = solution
            .edges
            .iter()
            .map(|&(u, v)| {
                graph
                    .edge_between(u, v)
                    .ok_or_else(|| anyhow!("Edge ({}, {}) does not exist in the graph", u, v))
            })
            .collect::<Result<Vec<usize>>>()?;
        Self::new(graph, &edges)
    }

    #[inline]
    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    #[inline]
    pub fn weight(&self) -> Weight {
        self.weight
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.num_edges + 1
    }

    #[inline]
    pub fn num_key_paths(&self) -> usize {
        self.num_paths
    }

    #[inline]
    pub fn contains(&self, v: usize) -> bool {
        self.graph.is_terminal(v) || !self.incident[v].is_empty()
    }

    #[inline]
    pub fn has_edge(&self, e: usize) -> bool {
        self.in_tree[e]
    }

    #[inline]
    pub fn degree(&self, v: usize) -> usize {
        self.incident[v].len()
    }

    /// A member that is a terminal or whose degree is not 2.
    #[inline]
    pub fn is_key(&self, v: usize) -> bool {
        self.contains(v) && (self.graph.is_terminal(v) || self.incident[v].len() != 2)
    }

    /// Tree edges incident to `v`.
    #[inline]
    pub fn incident(&self, v: usize) -> &[usize] {
        &self.incident[v]
    }

    pub fn neighbors(&self, v: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.incident[v]
            .iter()
            .map(move |&e| (self.graph.edge(e).other(v), e))
    }

    pub fn vertices(&self) -> Vec<usize> {
        (0..self.graph.num_nodes)
            .filter(|&v| self.contains(v))
            .collect()
    }

    pub fn edges(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.graph.num_edges()).filter(|&e| self.in_tree[e])
    }

    #[inline]
    pub fn key_path(&self, id: usize) -> Option<&KeyPath> {
        self.paths.get(id).and_then(|p| p.as_ref())
    }

    pub fn key_paths(&self) -> impl Iterator<Item = (usize, &KeyPath)> {
        self.paths
            .iter()
            .enumerate()
            .filter_map(|(id, p)| p.as_ref().map(|p| (id, p)))
    }

    /// Key paths having `v` as an endpoint.
    #[inline]
    pub fn paths_at(&self, v: usize) -> &[usize] {
        &self.ends_at[v]
    }

    /// The key path `v` is an interior vertex of.
    #[inline]
    pub fn path_through(&self, v: usize) -> Option<usize> {
        let id = self.interior_of[v];
        (id != NONE).then_some(id)
    }

    #[inline]
    pub fn path_of_edge(&self, e: usize) -> Option<usize> {
        let id = self.edge_path[e];
        (id != NONE).then_some(id)
    }

    #[inline]
    pub fn root(&self) -> usize {
        self.graph.terminals[0]
    }

    /// The tree edge from `v` towards the root.
    #[inline]
    pub fn parent_edge(&self, v: usize) -> Option<usize> {
        let e = self.up[v];
        (e != NONE).then_some(e)
    }

    #[inline]
    pub fn depth(&self, v: usize) -> usize {
        self.depth[v]
    }

    /// True when `x` lies in the subtree rooted at `a` (including `a`).
    #[inline]
    pub fn is_ancestor(&self, a: usize, x: usize) -> bool {
        self.enter[a] <= self.enter[x] && self.enter[x] <= self.exit[a]
    }

    /// Lowest common ancestor of two members, found by walking parent edges.
    pub fn meet(&self, mut a: usize, mut b: usize) -> usize {
        while a != b {
            let (deeper, other) = if self.depth[a] >= self.depth[b] {
                (a, b)
            } else {
                (b, a)
            };
            let e = self.up[deeper];
            if e == NONE {
                return deeper;
            }
            a = self.graph.edge(e).other(deeper);
            b = other;
        }
        a
    }

    pub fn to_solution(&self) -> Solution {
        Solution::from_edge_ids(self.graph, self.edges())
    }

    /// Resolves a candidate into the exact change it causes, pruning every
    /// non-terminal vertex the candidate would leave as a leaf.
    ///
    /// Edges in `removed` that are not tree edges and edges in `added` that
    /// already are, are ignored; an edge listed in both cancels out. Returns
    /// `None` when nothing changes or when the vertex and edge counts after
    /// the change cannot form a tree.
    pub fn settle(&self, removed: &[usize], added: &[usize]) -> Option<Change> {
        let added_set: HashSet<usize> = added
            .iter()
            .copied()
            .filter(|&e| !self.in_tree[e])
            .collect();
        let mut removed_set: HashSet<usize> = removed
            .iter()
            .copied()
            .filter(|&e| self.in_tree[e])
            .collect();
        // Re-adding a removed edge is a no-op.
        removed_set.retain(|e| !added.contains(e));
        if added_set.is_empty() && removed_set.is_empty() {
            return None;
        }

        let mut added_by_vertex: HashMap<usize, Vec<usize>> = HashMap::default();
        for &e in &added_set {
            let edge = self.graph.edge(e);
            added_by_vertex.entry(edge.u).or_default().push(e);
            added_by_vertex.entry(edge.v).or_default().push(e);
        }

        let mut overlay: HashMap<usize, Vec<usize>> = HashMap::default();
        let init = |x: usize| -> Vec<usize> {
            let mut list: Vec<usize> = self.incident[x]
                .iter()
                .copied()
                .filter(|e| !removed_set.contains(e))
                .collect();
            if let Some(extra) = added_by_vertex.get(&x) {
                list.extend(extra.iter().copied());
            }
            list
        };
        for &e in removed_set.iter().chain(added_set.iter()) {
            let edge = self.graph.edge(e);
            for x in [edge.u, edge.v] {
                if !overlay.contains_key(&x) {
                    let list = init(x);
                    overlay.insert(x, list);
                }
            }
        }

        let mut stack: Vec<usize> = overlay
            .iter()
            .filter(|&(&x, list)| list.len() == 1 && !self.graph.is_terminal(x))
            .map(|(&x, _)| x)
            .collect();
        stack.sort_unstable();
        let mut pruned: Vec<usize> = Vec::new();
        while let Some(x) = stack.pop() {
            let e = match overlay.get(&x) {
                Some(list) if list.len() == 1 && !self.graph.is_terminal(x) => list[0],
                _ => continue,
            };
            let y = self.graph.edge(e).other(x);
            if let Some(list) = overlay.get_mut(&x) {
                list.clear();
            }
            if !overlay.contains_key(&y) {
                let list = init(y);
                overlay.insert(y, list);
            }
            if let Some(list) = overlay.get_mut(&y) {
                list.retain(|&f| f != e);
                if list.len() == 1 && !self.graph.is_terminal(y) {
                    stack.push(y);
                }
            }
            pruned.push(e);
        }

        let mut removed_edges: Vec<usize> = removed_set.iter().copied().collect();
        let mut added_edges: Vec<usize> = Vec::with_capacity(added_set.len());
        for &e in &pruned {
            if self.in_tree[e] {
                removed_edges.push(e);
            }
        }
        let pruned_set: HashSet<usize> = pruned.iter().copied().collect();
        added_edges.extend(added_set.iter().copied().filter(|e| !pruned_set.contains(e)));
        if removed_edges.is_empty() && added_edges.is_empty() {
            return None;
        }
        removed_edges.sort_unstable();
        added_edges.sort_unstable();

        let mut touched: Vec<usize> = Vec::with_capacity(overlay.len());
        let mut added_vertices = Vec::new();
        let mut removed_vertices = Vec::new();
        for (&x, list) in &overlay {
            let before = self.contains(x);
            let after = self.graph.is_terminal(x) || !list.is_empty();
            match (before, after) {
                (false, true) => added_vertices.push(x),
                (true, false) => removed_vertices.push(x),
                _ => {}
            }
            if list.len() != self.incident[x].len() || before != after {
                touched.push(x);
            } else if list.iter().any(|e| !self.in_tree[*e]) {
                touched.push(x);
            }
        }
        touched.sort_unstable();
        added_vertices.sort_unstable();
        removed_vertices.sort_unstable();

        let edges_after = self.num_edges + added_edges.len() - removed_edges.len();
        let vertices_after = self.num_vertices() + added_vertices.len() - removed_vertices.len();
        if edges_after + 1 != vertices_after {
            return None;
        }

        let gain = self.graph.total_weight(&removed_edges) as i64
            - self.graph.total_weight(&added_edges) as i64;
        Some(Change {
            added_edges,
            removed_edges,
            added_vertices,
            removed_vertices,
            touched,
            gain,
        })
    }

    /// Applies a change produced by [`TreeState::settle`] on this state and
    /// returns the vertices whose neighbourhood changed: the touched vertices
    /// still in the tree plus every vertex of a re-traced key path.
    pub fn apply(&mut self, change: &Change) -> Vec<usize> {
        let before = self.weight;
        let mut seeds: Vec<usize> = Vec::new();
        for &v in &change.touched {
            self.dissolve(v, &mut seeds);
        }
        for &e in &change.removed_edges {
            if self.in_tree[e] {
                self.detach_edge(e);
            }
        }
        for &e in &change.added_edges {
            if !self.in_tree[e] {
                self.attach_edge(e);
            }
        }

        let mut pruned = Vec::new();
        self.prune_from(change.touched.iter().copied(), &mut pruned, &mut seeds);
        debug_assert!(pruned.is_empty(), "settled change left prunable leaves");
        debug_assert_eq!(before as i64 - self.weight as i64, change.gain);

        seeds.extend(change.touched.iter().copied());
        seeds.sort_unstable();
        seeds.dedup();
        let mut dirty = self.rebuild_paths(&seeds);
        dirty.extend(seeds.into_iter().filter(|&v| self.contains(v)));
        dirty.sort_unstable();
        dirty.dedup();
        self.order_from_root();
        dirty
    }

    /// Checks every structural invariant; used by tests and debug runs.
    pub fn validate(&self) -> Result<()> {
        let members = self.vertices();
        if members.len() != self.num_edges + 1 {
            return Err(anyhow!(
                "{} vertices but {} edges",
                members.len(),
                self.num_edges
            ));
        }
        if self.reachable_from(self.graph.terminals[0]) != members.len() {
            return Err(anyhow!("Tree is disconnected"));
        }
        for &v in &members {
            if !self.graph.is_terminal(v) && self.degree(v) < 2 {
                return Err(anyhow!("Non-terminal vertex {} has degree {}", v, self.degree(v)));
            }
        }
        let total: Weight = self.edges().map(|e| self.graph.weight(e)).sum();
        if total != self.weight {
            return Err(anyhow!("Cached weight {} differs from {}", self.weight, total));
        }

        let mut covered = 0;
        for (id, path) in self.key_paths() {
            let (a, b) = path.ends();
            if !self.is_key(a) || !self.is_key(b) {
                return Err(anyhow!("Key path #{} ends at a non-key vertex", id));
            }
            if !self.ends_at[a].contains(&id) || !self.ends_at[b].contains(&id) {
                return Err(anyhow!("Key path #{} is not indexed at its endpoints", id));
            }
            for &v in path.interior() {
                if self.is_key(v) || self.interior_of[v] != id {
                    return Err(anyhow!("Key path #{} has a bad interior vertex {}", id, v));
                }
            }
            let mut weight = 0;
            for (i, &e) in path.edges.iter().enumerate() {
                let edge = self.graph.edge(e);
                let (x, y) = (path.vertices[i], path.vertices[i + 1]);
                if !self.in_tree[e] || self.edge_path[e] != id || edge.other(x) != y {
                    return Err(anyhow!("Key path #{} has a bad edge {}", id, e));
                }
                weight += edge.weight;
            }
            if weight != path.weight {
                return Err(anyhow!("Key path #{} has a stale weight", id));
            }
            covered += path.edges.len();
        }
        for &v in &members {
            if v == self.root() {
                continue;
            }
            let e = self.up[v];
            if e == NONE || !self.in_tree[e] {
                return Err(anyhow!("Vertex {} has no parent edge", v));
            }
            let parent = self.graph.edge(e).other(v);
            if self.depth[v] != self.depth[parent] + 1 || !self.is_ancestor(parent, v) {
                return Err(anyhow!("Vertex {} is misplaced under {}", v, parent));
            }
        }

        if covered != self.num_edges {
            return Err(anyhow!(
                "Key paths cover {} of {} tree edges",
                covered,
                self.num_edges
            ));
        }
        Ok(())
    }

    /// Iterative depth-first walk from the root recording parent edges,
    /// depths and preorder intervals.
    fn order_from_root(&mut self) {
        let root = self.root();
        self.up[root] = NONE;
        self.depth[root] = 0;
        self.enter[root] = 0;
        let mut clock = 1;
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        while let Some(top) = stack.last_mut() {
            let (x, i) = *top;
            if i == self.incident[x].len() {
                self.exit[x] = clock - 1;
                stack.pop();
                continue;
            }
            top.1 += 1;
            let e = self.incident[x][i];
            if e == self.up[x] {
                continue;
            }
            let y = self.graph.edge(e).other(x);
            self.up[y] = e;
            self.depth[y] = self.depth[x] + 1;
            self.enter[y] = clock;
            clock += 1;
            stack.push((y, 0));
        }
    }

    fn reachable_from(&self, root: usize) -> usize {
        let mut visited = vec![false; self.graph.num_nodes];
        let mut queue = VecDeque::from([root]);
        visited[root] = true;
        let mut reached = 1;
        while let Some(x) = queue.pop_front() {
            for (y, _) in self.neighbors(x) {
                if !visited[y] {
                    visited[y] = true;
                    reached += 1;
                    queue.push_back(y);
                }
            }
        }
        reached
    }

    fn attach_edge(&mut self, e: usize) {
        let edge = *self.graph.edge(e);
        self.in_tree[e] = true;
        self.incident[edge.u].push(e);
        self.incident[edge.v].push(e);
        self.num_edges += 1;
        self.weight += edge.weight;
    }

    fn detach_edge(&mut self, e: usize) {
        let edge = *self.graph.edge(e);
        self.in_tree[e] = false;
        for x in [edge.u, edge.v] {
            if let Some(pos) = self.incident[x].iter().position(|&f| f == e) {
                self.incident[x].swap_remove(pos);
            }
        }
        self.num_edges -= 1;
        self.weight -= edge.weight;
    }

    /// Strips non-terminal leaves, cascading towards the rest of the tree.
    fn prune_from(
        &mut self,
        start: impl IntoIterator<Item = usize>,
        pruned: &mut Vec<usize>,
        seeds: &mut Vec<usize>,
    ) {
        let mut stack: Vec<usize> = start.into_iter().collect();
        while let Some(v) = stack.pop() {
            if self.graph.is_terminal(v) || self.incident[v].len() != 1 {
                continue;
            }
            let e = self.incident[v][0];
            let u = self.graph.edge(e).other(v);
            self.dissolve(v, seeds);
            self.dissolve(u, seeds);
            self.detach_edge(e);
            pruned.push(e);
            seeds.push(u);
            stack.push(u);
        }
    }

    fn dissolve(&mut self, v: usize, seeds: &mut Vec<usize>) {
        if self.interior_of[v] != NONE {
            self.remove_path(self.interior_of[v], seeds);
        }
        for id in std::mem::take(&mut self.ends_at[v]) {
            self.remove_path(id, seeds);
        }
    }

    fn remove_path(&mut self, id: usize, seeds: &mut Vec<usize>) {
        let Some(path) = self.paths[id].take() else {
            return;
        };
        for &e in &path.edges {
            self.edge_path[e] = NONE;
        }
        for &v in path.interior() {
            self.interior_of[v] = NONE;
        }
        let (a, b) = path.ends();
        self.ends_at[a].retain(|&p| p != id);
        self.ends_at[b].retain(|&p| p != id);
        seeds.push(a);
        seeds.push(b);
        self.free.push(id);
        self.num_paths -= 1;
    }

    fn insert_path(&mut self, path: KeyPath) -> usize {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                self.paths.push(None);
                self.paths.len() - 1
            }
        };
        for &e in &path.edges {
            self.edge_path[e] = id;
        }
        for &v in path.interior() {
            self.interior_of[v] = id;
        }
        let (a, b) = path.ends();
        self.ends_at[a].push(id);
        self.ends_at[b].push(id);
        self.paths[id] = Some(path);
        self.num_paths += 1;
        id
    }

    /// Walks from key vertex `start` along `first` until the next key vertex.
    fn trace(&self, start: usize, first: usize) -> KeyPath {
        let mut vertices = vec![start];
        let mut edges = Vec::new();
        let mut weight = 0;
        let (mut current, mut edge) = (start, first);
        loop {
            let next = self.graph.edge(edge).other(current);
            vertices.push(next);
            edges.push(edge);
            weight += self.graph.weight(edge);
            if self.is_key(next) {
                break;
            }
            let Some(&onward) = self.incident[next].iter().find(|&&f| f != edge) else {
                break;
            };
            current = next;
            edge = onward;
        }
        KeyPath {
            vertices,
            edges,
            weight,
        }
    }

    /// From a degree-2 vertex, follows `edge` to the first key vertex and
    /// returns it with the edge it was entered by.
    fn walk_to_key(&self, start: usize, first: usize) -> (usize, usize) {
        let (mut current, mut edge) = (start, first);
        loop {
            let next = self.graph.edge(edge).other(current);
            if self.is_key(next) {
                return (next, edge);
            }
            let Some(&onward) = self.incident[next].iter().find(|&&f| f != edge) else {
                return (next, edge);
            };
            current = next;
            edge = onward;
        }
    }

    /// Traces a key path over every uncovered tree edge reachable from
    /// `seeds`; returns the vertices of the new paths.
    fn rebuild_paths(&mut self, seeds: &[usize]) -> Vec<usize> {
        let mut rebuilt = Vec::new();
        for &s in seeds {
            if !self.contains(s) {
                continue;
            }
            let starts: Vec<(usize, usize)> = self.incident[s]
                .iter()
                .filter(|&&e| self.edge_path[e] == NONE)
                .map(|&e| {
                    if self.is_key(s) {
                        (s, e)
                    } else {
                        self.walk_to_key(s, e)
                    }
                })
                .collect();
            for (k, e) in starts {
                if self.edge_path[e] != NONE {
                    continue;
                }
                let path = self.trace(k, e);
                rebuilt.extend(path.vertices.iter().copied());
                self.insert_path(path);
            }
        }
        rebuilt
    }
}
