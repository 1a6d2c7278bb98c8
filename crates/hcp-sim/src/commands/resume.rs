use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use hcp_graph::read_graph;

#[derive(Args, Debug)]
pub struct ResumeArgs {
    /// Checkpoint written by an earlier run.
    #[arg(long)]
    pub checkpoint: PathBuf,
    /// The graph the checkpointed run used.
    #[arg(long)]
    pub graph: PathBuf,
}

pub fn run(args: &ResumeArgs) -> Result<(), Box<dyn Error>> {
    let graph = read_graph(&args.graph)?;
    let summary = hcp_mcmc::resume(&args.checkpoint, &graph)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
