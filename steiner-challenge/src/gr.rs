// PACE 2018 instance and solution formats. Vertex ids are 1-based on disk
// and 0-based in memory.

use crate::graph::{Graph, Weight};
use crate::solution::Solution;
use anyhow::{anyhow, Context, Result};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Graph,
    Terminals,
    Other,
}

fn parse_field<T: std::str::FromStr>(token: Option<&str>, line_no: usize, what: &str) -> Result<T> {
    let token = token.ok_or_else(|| anyhow!("Line {}: missing {}", line_no, what))?;
    token
        .parse::<T>()
        .map_err(|_| anyhow!("Line {}: invalid {} '{}'", line_no, what, token))
}

fn to_zero_based(id: usize, num_nodes: usize, line_no: usize) -> Result<usize> {
    if id == 0 || id > num_nodes {
        return Err(anyhow!(
            "Line {}: vertex {} outside 1..={}",
            line_no,
            id,
            num_nodes
        ));
    }
    Ok(id - 1)
}

impl Graph {
    pub fn from_gr(input: &str) -> Result<Self> {
        let mut section = Section::None;
        let mut num_nodes: Option<usize> = None;
        let mut declared_edges: Option<usize> = None;
        let mut declared_terminals: Option<usize> = None;
        let mut edges: Vec<(usize, usize, Weight)> = Vec::new();
        let mut terminals: Vec<usize> = Vec::new();

        for (i, raw) in input.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let Some(head) = tokens.next() else { continue };

            match (section, head.to_ascii_uppercase().as_str()) {
                (_, "SECTION") => {
                    section = match tokens.next().map(|s| s.to_ascii_lowercase()) {
                        Some(name) if name == "graph" => Section::Graph,
                        Some(name) if name == "terminals" => Section::Terminals,
                        _ => Section::Other,
                    };
                }
                (_, "END") => section = Section::None,
                (_, "EOF") => break,
                (Section::Graph, "NODES") => {
                    num_nodes = Some(parse_field(tokens.next(), line_no, "node count")?);
                }
                (Section::Graph, "EDGES") => {
                    declared_edges = Some(parse_field(tokens.next(), line_no, "edge count")?);
                }
                (Section::Graph, "E") => {
                    let n = num_nodes
                        .ok_or_else(|| anyhow!("Line {}: edge before node count", line_no))?;
                    let u: usize = parse_field(tokens.next(), line_no, "edge endpoint")?;
                    let v: usize = parse_field(tokens.next(), line_no, "edge endpoint")?;
                    let w: Weight = parse_field(tokens.next(), line_no, "edge weight")?;
                    edges.push((
                        to_zero_based(u, n, line_no)?,
                        to_zero_based(v, n, line_no)?,
                        w,
                    ));
                }
                (Section::Terminals, "TERMINALS") => {
                    declared_terminals =
                        Some(parse_field(tokens.next(), line_no, "terminal count")?);
                }
                (Section::Terminals, "T") => {
                    let n = num_nodes
                        .ok_or_else(|| anyhow!("Line {}: terminal before node count", line_no))?;
                    let t: usize = parse_field(tokens.next(), line_no, "terminal")?;
                    terminals.push(to_zero_based(t, n, line_no)?);
                }
                (Section::Other, _) | (Section::None, _) => {}
                (_, other) => {
                    return Err(anyhow!("Line {}: unexpected keyword '{}'", line_no, other));
                }
            }
        }

        let num_nodes = num_nodes.ok_or_else(|| anyhow!("Missing 'Nodes' declaration"))?;
        if let Some(m) = declared_edges {
            if m != edges.len() {
                return Err(anyhow!(
                    "Declared {} edges but found {}",
                    m,
                    edges.len()
                ));
            }
        }
        if let Some(t) = declared_terminals {
            if t != terminals.len() {
                return Err(anyhow!(
                    "Declared {} terminals but found {}",
                    t,
                    terminals.len()
                ));
            }
        }
        Graph::new(num_nodes, edges, terminals)
    }

    pub fn read_gr(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read instance file {:?}", path))?;
        Self::from_gr(&content).with_context(|| format!("Failed to parse instance file {:?}", path))
    }

    pub fn to_gr(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(&mut output, "SECTION Graph");
        let _ = writeln!(&mut output, "Nodes {}", self.num_nodes);
        let _ = writeln!(&mut output, "Edges {}", self.num_edges());
        for edge in &self.edges {
            let _ = writeln!(&mut output, "E {} {} {}", edge.u + 1, edge.v + 1, edge.weight);
        }
        let _ = writeln!(&mut output, "END");
        let _ = writeln!(&mut output);

        let _ = writeln!(&mut output, "SECTION Terminals");
        let _ = writeln!(&mut output, "Terminals {}", self.num_terminals());
        for &t in &self.terminals {
            let _ = writeln!(&mut output, "T {}", t + 1);
        }
        let _ = writeln!(&mut output, "END");
        let _ = writeln!(&mut output);
        let _ = writeln!(&mut output, "EOF");

        output
    }
}

impl Solution {
    /// `VALUE <weight>` followed by one `u v` line per edge.
    pub fn to_pace(&self, weight: Weight) -> String {
        let mut output = String::new();
        let _ = writeln!(&mut output, "VALUE {}", weight);
        for &(u, v) in &self.edges {
            let _ = writeln!(&mut output, "{} {}", u + 1, v + 1);
        }
        output
    }

    /// Parses the output of [`Solution::to_pace`]. The `VALUE` line is
    /// optional and ignored; weights are recomputed on verification.
    pub fn from_pace(input: &str) -> Result<Self> {
        let mut edges = Vec::new();
        for (i, raw) in input.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() || line.to_ascii_uppercase().starts_with("VALUE") {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let u: usize = parse_field(tokens.next(), line_no, "edge endpoint")?;
            let v: usize = parse_field(tokens.next(), line_no, "edge endpoint")?;
            if u == 0 || v == 0 {
                return Err(anyhow!("Line {}: vertex ids are 1-based", line_no));
            }
            edges.push((u - 1, v - 1));
        }
        Ok(Self { edges })
    }
}
