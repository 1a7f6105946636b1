use ahash::RandomState;
use anyhow::Result;
use serde_json::{Map, Value};
use steiner_challenge::{Graph, Solution};

pub(crate) type HashMap<K, V> = std::collections::HashMap<K, V, RandomState>;
pub(crate) type HashSet<T> = std::collections::HashSet<T, RandomState>;

/// Sentinel for "no vertex / no edge / no key path".
pub const NONE: usize = usize::MAX;

pub mod cancel;
pub mod local_search;
pub mod mst;
pub mod neighborhood;
pub mod oracle;
pub mod params;
pub mod start;
pub mod tree;

pub use cancel::{Cancellation, Deadline, StopFlag, Unbounded};
pub use local_search::{LocalSearch, Phase, SearchOutcome, Termination};
pub use oracle::DistanceOracle;
pub use params::{Neighborhood, Params, Selection, StartStrategy};
pub use tree::{Change, KeyPath, TreeState};

/// Builds the starting tree selected by `params` and improves it until the
/// search terminates. Input errors (such as terminals split across
/// components) are returned before any search starts.
pub fn solve(graph: &Graph, params: &Params, cancel: &dyn Cancellation) -> Result<SearchOutcome> {
    let tree = start::build(graph, params.start, params.dense_network_limit)?;
    Ok(LocalSearch::new(tree, params).run(cancel))
}

/// Solves with hyperparameters merged over the defaults and no time limit.
pub fn solve_challenge(
    graph: &Graph,
    hyperparameters: &Option<Map<String, Value>>,
) -> Result<Option<Solution>> {
    let params = Params::initialize(hyperparameters)?;
    let outcome = solve(graph, &params, &Unbounded)?;
    Ok(Some(outcome.solution))
}
