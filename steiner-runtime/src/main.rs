use anyhow::{anyhow, Context, Result};
use clap::{arg, ArgAction, Command};
use log::{error, info, LevelFilter};
use serde::Serialize;
use serde_json::{Map, Value};
use std::{fs, path::Path, path::PathBuf, time::Duration};
use steiner_algorithms::{solve, Cancellation, Deadline, Params, SearchOutcome, Unbounded};
use steiner_challenge::{Graph, Solution, Track};

fn cli() -> Command {
    Command::new("steiner-runtime")
        .about("Computes, verifies and generates Steiner tree instances")
        .arg_required_else_help(true)
        .arg(
            arg!(-v --verbose "Log every applied move")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("solve")
                .about("Builds a starting tree and improves it by local search")
                .arg(
                    arg!(<GRAPH> ... "Instance files in PACE .gr format")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-s --start [START] "Starting heuristic [default: dnh]")
                        .value_parser(["dnh", "mst"]),
                )
                .arg(
                    arg!(-m --method [METHOD] "Neighborhood to search, may be repeated [default: kv]")
                        .value_parser(["kv", "sv"])
                        .action(ArgAction::Append),
                )
                .arg(
                    arg!(-n --"no-early-stop" "Confirm every local optimum with a full rescan")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(-t --timeout [SECONDS] "Time budget per instance, 0 for none")
                        .default_value("3600")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--hyperparameters [HYPERPARAMETERS] "Hyperparameters json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--output [OUTPUT_FILE] "If set, the json report is saved to this file path")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--save [SAVE_DIR] "If set, each solution is saved to <SAVE_DIR>/<instance>.sol")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Verifies a solution and prints its weight")
                .arg(
                    arg!(<GRAPH> "Instance file in PACE .gr format")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(<SOLUTION> "Solution file: VALUE line plus one edge per line")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Writes a seeded random instance in PACE .gr format")
                .arg(
                    arg!(--seed [SEED] "Seed for the generator")
                        .default_value("0")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--nodes [NODES] "Number of vertices")
                        .default_value("200")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--terminals [TERMINALS] "Number of terminals")
                        .default_value("20")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"extra-edges" [EXTRA] "Extra edges per vertex on top of a spanning tree")
                        .default_value("2")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"max-weight" [MAX_WEIGHT] "Largest edge weight")
                        .default_value("100")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--output [OUTPUT_FILE] "If set, the instance is saved to this file path")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

fn main() {
    let matches = cli().get_matches();

    let level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = match matches.subcommand() {
        Some(("solve", sub_m)) => solve_instances(
            sub_m
                .get_many::<PathBuf>("GRAPH")
                .map(|paths| paths.cloned().collect())
                .unwrap_or_default(),
            sub_m.get_one::<String>("start").cloned(),
            sub_m
                .get_many::<String>("method")
                .map(|methods| methods.cloned().collect()),
            sub_m.get_flag("no-early-stop"),
            sub_m.get_one::<u64>("timeout").copied().unwrap_or(0),
            sub_m.get_one::<String>("hyperparameters").cloned(),
            sub_m.get_one::<PathBuf>("output").cloned(),
            sub_m.get_one::<PathBuf>("save").cloned(),
        ),
        Some(("verify", sub_m)) => verify(
            sub_m.get_one::<PathBuf>("GRAPH").unwrap().clone(),
            sub_m.get_one::<PathBuf>("SOLUTION").unwrap().clone(),
        ),
        Some(("generate", sub_m)) => generate(
            *sub_m.get_one::<u64>("seed").unwrap(),
            Track {
                num_nodes: *sub_m.get_one::<usize>("nodes").unwrap(),
                num_terminals: *sub_m.get_one::<usize>("terminals").unwrap(),
                extra_edges_per_node: *sub_m.get_one::<usize>("extra-edges").unwrap(),
                max_weight: *sub_m.get_one::<u64>("max-weight").unwrap(),
            },
            sub_m.get_one::<PathBuf>("output").cloned(),
        ),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[derive(Serialize, Debug)]
struct InstanceReport {
    instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<SearchOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize, Debug)]
struct Report {
    params: Params,
    timeout: u64,
    instances: Vec<InstanceReport>,
}

fn load_hyperparameters(hyperparameters: &str) -> Result<Map<String, Value>> {
    let content = if hyperparameters.ends_with(".json") {
        fs::read_to_string(hyperparameters)
            .with_context(|| format!("Failed to read hyperparameters file {}", hyperparameters))?
    } else {
        hyperparameters.to_string()
    };
    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("Hyperparameters must be a json object, got {}", other)),
    }
}

/// Hyperparameters from `--hyperparameters`, with the dedicated flags
/// taking precedence.
fn build_params(
    start: Option<String>,
    methods: Option<Vec<String>>,
    no_early_stop: bool,
    hyperparameters: Option<String>,
) -> Result<Params> {
    let mut map = match hyperparameters {
        Some(h) => load_hyperparameters(&h)?,
        None => Map::new(),
    };
    if let Some(start) = start {
        map.insert("start".to_string(), Value::String(start));
    }
    if let Some(methods) = methods {
        map.insert(
            "neighborhoods".to_string(),
            Value::Array(methods.into_iter().map(Value::String).collect()),
        );
    }
    if no_early_stop {
        map.insert("early_stop".to_string(), Value::Bool(false));
    }
    Params::initialize(&Some(map))
}

fn solve_one(path: &Path, params: &Params, timeout: u64) -> Result<SearchOutcome> {
    let graph = Graph::read_gr(path)?;
    info!(
        "{}: {} vertices, {} edges, {} terminals",
        path.display(),
        graph.num_nodes,
        graph.num_edges(),
        graph.num_terminals()
    );
    let cancel: Box<dyn Cancellation> = if timeout == 0 {
        Box::new(Unbounded)
    } else {
        Box::new(Deadline::after(Duration::from_secs(timeout)))
    };
    let outcome = solve(&graph, params, cancel.as_ref())
        .with_context(|| format!("Failed to solve {}", path.display()))?;
    graph.verify_solution(&outcome.solution)?;
    Ok(outcome)
}

#[allow(clippy::too_many_arguments)]
pub fn solve_instances(
    paths: Vec<PathBuf>,
    start: Option<String>,
    methods: Option<Vec<String>>,
    no_early_stop: bool,
    timeout: u64,
    hyperparameters: Option<String>,
    output_file: Option<PathBuf>,
    save_dir: Option<PathBuf>,
) -> Result<()> {
    let params = build_params(start, methods, no_early_stop, hyperparameters)?;
    info!(
        "Solving {} instance(s): start {:?}, neighborhoods {:?}, early stop {}",
        paths.len(),
        params.start,
        params.neighborhoods,
        params.early_stop
    );

    // Each solve owns its graph and tree; nothing is shared but `params`.
    let results: Vec<Result<SearchOutcome>> = std::thread::scope(|s| {
        let handles: Vec<_> = paths
            .iter()
            .map(|path| {
                let params = &params;
                s.spawn(move || solve_one(path, params, timeout))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(anyhow!("Solver thread panicked")))
            })
            .collect()
    });

    if let Some(dir) = &save_dir {
        fs::create_dir_all(dir)?;
    }
    let mut instances = Vec::with_capacity(paths.len());
    let mut failures = 0;
    for (path, result) in paths.iter().zip(results) {
        let instance = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match result {
            Ok(outcome) => {
                println!("{}: {}", instance, outcome.weight);
                if let Some(dir) = &save_dir {
                    let file = dir.join(format!("{}.sol", instance));
                    fs::write(&file, outcome.solution.to_pace(outcome.weight))?;
                }
                instances.push(InstanceReport {
                    instance,
                    outcome: Some(outcome),
                    error: None,
                });
            }
            Err(e) => {
                error!("{}: {:#}", instance, e);
                failures += 1;
                instances.push(InstanceReport {
                    instance,
                    outcome: None,
                    error: Some(format!("{:#}", e)),
                });
            }
        }
    }

    if let Some(path) = output_file {
        let report = Report {
            params,
            timeout,
            instances,
        };
        fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        println!("report written to: {:?}", path);
    }
    if failures > 0 {
        return Err(anyhow!("{} of {} instance(s) failed", failures, paths.len()));
    }
    Ok(())
}

pub fn verify(graph_path: PathBuf, solution_path: PathBuf) -> Result<()> {
    let graph = Graph::read_gr(&graph_path)?;
    let content = fs::read_to_string(&solution_path)
        .with_context(|| format!("Failed to read solution file {:?}", solution_path))?;
    let solution = Solution::from_pace(&content)?;
    let weight = graph
        .evaluate_solution(&solution)
        .map_err(|e| anyhow!("Invalid solution: {}", e))?;
    println!("Solution is valid with weight {}", weight);
    Ok(())
}

pub fn generate(seed: u64, track: Track, output_file: Option<PathBuf>) -> Result<()> {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    let graph = Graph::generate_instance(&bytes, &track)?;
    match output_file {
        Some(path) => {
            fs::write(&path, graph.to_gr())?;
            println!("instance written to: {:?}", path);
        }
        None => print!("{}", graph.to_gr()),
    }
    Ok(())
}
