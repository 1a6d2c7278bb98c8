use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    resume::{self, ResumeArgs},
    run::{self, RunArgs},
    score::{self, ScoreArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "hcp-sim", about = "Hierarchical consensus partition sampler CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the sampler from a YAML configuration.
    Run(RunArgs),
    /// Continue a run from a checkpoint file.
    Resume(ResumeArgs),
    /// Print counters and log-likelihood of a fixed assignment as JSON.
    Score(ScoreArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run::run(&args),
        Command::Resume(args) => resume::run(&args),
        Command::Score(args) => score::run(&args),
    }
}
