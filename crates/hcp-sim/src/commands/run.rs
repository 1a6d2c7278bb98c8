use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use hcp_graph::read_graph;
use hcp_mcmc::RunConfig;
use log::info;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML configuration (plain `key: value` parameter files work too).
    #[arg(long)]
    pub config: PathBuf,
    /// Graph file, overriding `gml_path`.
    #[arg(long)]
    pub graph: Option<PathBuf>,
    /// Output directory, overriding `save_directory`.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Master seed, overriding `seed_policy.master_seed`.
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let mut config = RunConfig::load(&args.config)?;
    if let Some(graph) = &args.graph {
        config.gml_path = Some(graph.clone());
    }
    if let Some(out) = &args.out {
        config.save_directory = Some(out.clone());
    }
    if let Some(seed) = args.seed {
        config.seed_policy.master_seed = seed;
    }
    let graph_path = config.graph_path()?;
    let graph = read_graph(graph_path)?;
    info!("loaded graph from {}", graph_path.display());
    let summary = hcp_mcmc::run(&config, &graph, config.seed_policy.master_seed)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
