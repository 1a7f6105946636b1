pub const BUILD_TIME_PATH: &str = env!("CARGO_MANIFEST_DIR");

pub mod generator;
pub mod gr;
pub mod graph;
pub mod solution;

pub use generator::Track;
pub use graph::{Edge, Graph, Weight, INFINITY};
pub use solution::Solution;
