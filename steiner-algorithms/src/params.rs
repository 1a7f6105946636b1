use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StartStrategy {
    /// Distance-network heuristic.
    Dnh,
    /// Minimum spanning tree of the whole graph, pruned.
    Mst,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Neighborhood {
    /// Key-vertex elimination and key-path exchange.
    #[serde(rename = "kv")]
    KeyVertex,
    /// Steiner-vertex insertion and elimination.
    #[serde(rename = "sv")]
    SteinerVertex,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    /// Scan the whole working set, apply the largest gain.
    Best,
    /// Apply the first improving move found.
    First,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Params {
    pub start: StartStrategy,

    /// Active move families; an empty list performs no local search.
    pub neighborhoods: Vec<Neighborhood>,

    /// Stop after `patience` consecutive non-improving partial scans instead
    /// of confirming the local optimum with a full rescan.
    pub early_stop: bool,
    pub patience: usize,

    pub selection: Selection,

    /// Distinct key paths or key vertices a non-tree vertex must touch to be
    /// considered for insertion. Values below 3 are treated as 3.
    pub sv_min_attachments: usize,

    /// Up to this many terminals, the distance-network heuristic works on
    /// the complete pairwise terminal network.
    pub dense_network_limit: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            start: StartStrategy::Dnh,
            neighborhoods: vec![Neighborhood::KeyVertex],
            early_stop: true,
            patience: 1,
            selection: Selection::Best,
            sv_min_attachments: 3,
            dense_network_limit: 128,
        }
    }
}

impl Params {
    /// Merges user hyperparameters over [`Params::default`].
    pub fn initialize(hyperparameters: &Option<Map<String, Value>>) -> Result<Self> {
        let mut merged = serde_json::to_value(Self::default())?;
        if let (Value::Object(ref mut obj), Some(map)) = (&mut merged, hyperparameters) {
            for (k, v) in map {
                if !obj.contains_key(k) {
                    return Err(anyhow!("Unknown hyperparameter '{}'", k));
                }
                obj.insert(k.clone(), v.clone());
            }
        }
        let mut params: Self = serde_json::from_value(merged)
            .map_err(|e| anyhow!("Invalid hyperparameters: {}", e))?;
        params.neighborhoods.sort_unstable();
        params.neighborhoods.dedup();
        Ok(params)
    }
}
