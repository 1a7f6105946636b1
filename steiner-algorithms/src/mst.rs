use steiner_challenge::Weight;

#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
    components: usize,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
            components: n,
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merges the sets of `a` and `b`; false when they were already joined.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        self.components -= 1;
        true
    }

    #[inline]
    pub fn components(&self) -> usize {
        self.components
    }
}

/// Kruskal over `(weight, u, v, id)` candidates on vertices `0..n`.
///
/// Ties are broken by `id`, so the forest is deterministic. Returns the ids
/// of the chosen edges.
pub fn kruskal(n: usize, mut candidates: Vec<(Weight, usize, usize, usize)>) -> Vec<usize> {
    candidates.sort_unstable_by_key(|&(w, _, _, id)| (w, id));
    let mut uf = UnionFind::new(n);
    let mut chosen = Vec::with_capacity(n.saturating_sub(1));
    for (_, u, v, id) in candidates {
        if uf.union(u, v) {
            chosen.push(id);
            if uf.components() == 1 {
                break;
            }
        }
    }
    chosen
}
