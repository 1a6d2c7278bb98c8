use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use hcp_core::errors::ErrorInfo;
use hcp_core::{HcpError, Network};
use hcp_graph::read_graph;
use hcp_mcmc::levels::{GroupMask, ROOT};
use hcp_mcmc::{GroupState, LikelihoodBreakdown, LogFactorialTable};
use serde::Serialize;

#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Graph file (GML or edge list).
    #[arg(long)]
    pub graph: PathBuf,
    /// Whitespace separated masks, one per node. The last non-empty line is
    /// used, so a `_configs.txt` file scores its final snapshot. Every node
    /// sits in the root level alone when omitted.
    #[arg(long)]
    pub groups: Option<PathBuf>,
    /// Number of levels; defaults to the highest bit used by any mask.
    #[arg(long = "num-groups")]
    pub num_groups: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ScoreReport {
    num_nodes: usize,
    num_edges: usize,
    num_groups: usize,
    group_size: Vec<u64>,
    hcg_pairs: Vec<u64>,
    hcg_edges: Vec<u64>,
    log_likelihood: f64,
    terms: Vec<f64>,
}

pub fn run(args: &ScoreArgs) -> Result<(), Box<dyn Error>> {
    let graph = read_graph(&args.graph)?;
    let masks = match &args.groups {
        Some(path) => read_masks(path)?,
        None => vec![ROOT; graph.num_nodes()],
    };
    let used = masks.iter().fold(0, |acc, &mask| acc | mask);
    let num_groups = args
        .num_groups
        .unwrap_or((GroupMask::BITS - used.leading_zeros()).max(1) as usize);
    let state = GroupState::from_masks(&graph, masks, num_groups, num_groups)?;
    let table = LogFactorialTable::for_pairs(graph.num_pairs());
    let breakdown = LikelihoodBreakdown::evaluate(&table, state.hcg_edges(), state.hcg_pairs());
    let report = ScoreReport {
        num_nodes: graph.num_nodes(),
        num_edges: graph.num_edges(),
        num_groups,
        group_size: state.group_size().to_vec(),
        hcg_pairs: state.hcg_pairs().to_vec(),
        hcg_edges: state.hcg_edges().to_vec(),
        log_likelihood: breakdown.total,
        terms: breakdown.terms,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn read_masks(path: &Path) -> Result<Vec<GroupMask>, HcpError> {
    let contents = fs::read_to_string(path).map_err(|err| HcpError::io("groups-read", path, err))?;
    let line = contents
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");
    line.split_whitespace()
        .map(|token| {
            token.parse::<GroupMask>().map_err(|_| {
                HcpError::Model(
                    ErrorInfo::new("invalid-mask", "group masks must be unsigned integers")
                        .with_context("token", token)
                        .with_context("path", path.display().to_string()),
                )
            })
        })
        .collect()
}
