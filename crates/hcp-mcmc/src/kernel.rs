use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hcp_core::errors::ErrorInfo;
use hcp_core::{HcpError, Network, RngHandle};
use hcp_graph::{canonical_hash as graph_hash, AdjacencyGraph};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::checkpoint::{self, CheckpointPayload};
use crate::config::RunConfig;
use crate::determinism;
use crate::likelihood::{LikelihoodBreakdown, LogFactorialTable};
use crate::manifest::{self, RunManifest};
use crate::metrics::{OutputPaths, Snapshot, SnapshotWriter};
use crate::moves::{self, DeathRule, MoveKind};
use crate::state::GroupState;

/// Outcome of one sampler step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProposalOutcome {
    /// Move type that was attempted.
    pub move_kind: MoveKind,
    /// Whether the proposal was accepted.
    pub accepted: bool,
    /// Forward proposal probability reported by the move generator.
    pub forward_prob: f64,
    /// Reverse proposal probability reported by the move generator.
    pub reverse_prob: f64,
    /// Metropolis acceptance probability `min(1, exp(delta))`.
    pub acceptance_prob: f64,
    /// Log-likelihood change of the proposal.
    pub delta_log_likelihood: f64,
}

/// Proposed / accepted counts for one move kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCount {
    /// Proposals drawn.
    pub proposed: u64,
    /// Proposals accepted.
    pub accepted: u64,
}

/// Per-kind move counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveStats {
    counts: BTreeMap<MoveKind, MoveCount>,
}

impl MoveStats {
    fn record(&mut self, kind: MoveKind, accepted: bool) {
        let entry = self.counts.entry(kind).or_default();
        entry.proposed += 1;
        if accepted {
            entry.accepted += 1;
        }
    }

    /// Counters of `kind`.
    pub fn count(&self, kind: MoveKind) -> MoveCount {
        self.counts.get(&kind).copied().unwrap_or_default()
    }

    /// Proposals drawn across all kinds.
    pub fn total_proposed(&self) -> u64 {
        self.counts.values().map(|count| count.proposed).sum()
    }

    /// Proposals accepted across all kinds.
    pub fn total_accepted(&self) -> u64 {
        self.counts.values().map(|count| count.accepted).sum()
    }

    /// Acceptance rate per move kind, keyed by [`MoveKind::as_str`].
    pub fn acceptance_rates(&self) -> BTreeMap<String, f64> {
        self.counts
            .iter()
            .map(|(kind, count)| {
                let rate = if count.proposed == 0 {
                    0.0
                } else {
                    count.accepted as f64 / count.proposed as f64
                };
                (kind.as_str().to_string(), rate)
            })
            .collect()
    }
}

/// Single-chain reversible-jump sampler over hierarchical group assignments.
///
/// The sampler owns its state and RNG exclusively; every [`step`](Self::step)
/// is fully applied or fully reverted before it returns.
pub struct Sampler<N: Network> {
    network: N,
    state: GroupState,
    table: LogFactorialTable,
    log_likelihood: f64,
    death_rule: DeathRule,
    rng: RngHandle,
    stats: MoveStats,
}

impl<N: Network> Sampler<N> {
    /// Wraps `state`, which must cover every node of `network`.
    pub fn new(
        network: N,
        state: GroupState,
        death_rule: DeathRule,
        seed: u64,
    ) -> Result<Self, HcpError> {
        if state.num_nodes() != network.num_nodes() {
            return Err(HcpError::Model(
                ErrorInfo::new("state-graph-mismatch", "state and graph sizes differ")
                    .with_context("state_nodes", state.num_nodes().to_string())
                    .with_context("graph_nodes", network.num_nodes().to_string()),
            ));
        }
        let table = LogFactorialTable::for_pairs(network.num_pairs());
        let log_likelihood = table.log_likelihood(state.hcg_edges(), state.hcg_pairs());
        Ok(Self {
            network,
            state,
            table,
            log_likelihood,
            death_rule,
            rng: RngHandle::from_seed(seed),
            stats: MoveStats::default(),
        })
    }

    /// Current group state.
    pub fn state(&self) -> &GroupState {
        &self.state
    }

    /// Graph the chain runs on.
    pub fn network(&self) -> &N {
        &self.network
    }

    /// Log-likelihood of the current state.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Per-level likelihood terms of the current state.
    pub fn likelihood_breakdown(&self) -> LikelihoodBreakdown {
        LikelihoodBreakdown::evaluate(&self.table, self.state.hcg_edges(), self.state.hcg_pairs())
    }

    /// Move counters accumulated so far.
    pub fn stats(&self) -> &MoveStats {
        &self.stats
    }

    /// Active death rule.
    pub fn death_rule(&self) -> DeathRule {
        self.death_rule
    }

    /// Starts a new RNG substream and puts the membership index in canonical
    /// order, so that the continuation depends only on masks and `seed`.
    pub fn begin_epoch(&mut self, seed: u64) {
        self.rng = RngHandle::from_seed(seed);
        self.state.reindex();
    }

    /// Performs one proposal / accept-or-reject step.
    pub fn step(&mut self) -> ProposalOutcome {
        let proposal = moves::propose(&self.state, self.death_rule, &mut self.rng);
        let probabilities = moves::proposal_probabilities(&self.state, self.death_rule, &proposal);
        let move_kind = proposal.kind();
        let Some(applied) = moves::apply(&mut self.state, &self.network, proposal) else {
            self.stats.record(move_kind, true);
            return ProposalOutcome {
                move_kind,
                accepted: true,
                forward_prob: probabilities.forward,
                reverse_prob: probabilities.reverse,
                acceptance_prob: 1.0,
                delta_log_likelihood: 0.0,
            };
        };
        let candidate = self
            .table
            .log_likelihood(self.state.hcg_edges(), self.state.hcg_pairs());
        let delta = candidate - self.log_likelihood;
        let acceptance_prob = delta.exp().min(1.0);
        let accepted = self.rng.uniform() < acceptance_prob;
        if accepted {
            moves::commit(&mut self.state, applied);
            self.log_likelihood = candidate;
        } else {
            moves::revert(&mut self.state, &self.network, applied);
        }
        self.stats.record(move_kind, accepted);
        trace!(
            "{} delta={delta:.6} accepted={accepted}",
            proposal.describe()
        );
        ProposalOutcome {
            move_kind,
            accepted,
            forward_prob: probabilities.forward,
            reverse_prob: probabilities.reverse,
            acceptance_prob,
            delta_log_likelihood: delta,
        }
    }

    /// Copies the observable state out of the sampler, tagged with the
    /// zero-based index of the step just taken.
    pub fn snapshot(&self, iteration: u64) -> Snapshot {
        Snapshot {
            iteration,
            num_groups: self.state.num_groups(),
            masks: self.state.masks().to_vec(),
            group_size: self.state.group_size().to_vec(),
            hcg_pairs: self.state.hcg_pairs().to_vec(),
            hcg_edges: self.state.hcg_edges().to_vec(),
            log_likelihood: self.log_likelihood,
        }
    }

    /// Consumes the sampler, returning its state.
    pub fn into_state(self) -> GroupState {
        self.state
    }
}

/// Summary returned to callers after a run (or run segment) completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// Iteration the segment started from.
    pub start_iteration: u64,
    /// Iterations completed at the end.
    pub iterations: u64,
    /// Acceptance rate per move kind.
    pub acceptance_rates: BTreeMap<String, f64>,
    /// Log-likelihood of the final state.
    pub final_log_likelihood: f64,
    /// Level count of the final state.
    pub final_num_groups: usize,
    /// Canonical hash of the final state.
    pub final_state_hash: String,
    /// Canonical hash of the graph.
    pub graph_hash: String,
    /// Snapshots written by this segment.
    pub snapshots_written: u64,
    /// Snapshot files written by this segment.
    pub outputs: OutputPaths,
    /// Manifest path.
    pub manifest_path: PathBuf,
    /// Checkpoint files still on disk.
    pub checkpoints: Vec<PathBuf>,
}

/// Builds the starting state: explicit masks if configured, otherwise a
/// random assignment drawn from the dedicated initial-state substream.
pub fn initial_state<N: Network>(
    config: &RunConfig,
    network: &N,
    seed: u64,
) -> Result<GroupState, HcpError> {
    match &config.initial_group_config {
        Some(masks) => GroupState::from_masks(
            network,
            masks.clone(),
            config.initial_num_groups,
            config.max_num_groups,
        ),
        None => {
            let mut rng = RngHandle::from_seed(determinism::initial_state_seed(seed));
            GroupState::random(
                network,
                config.initial_num_groups,
                config.max_num_groups,
                &mut rng,
            )
        }
    }
}

/// Runs the sampler from scratch with the provided configuration and seed.
pub fn run(config: &RunConfig, graph: &AdjacencyGraph, seed: u64) -> Result<RunSummary, HcpError> {
    let config = config.validate()?;
    let state = initial_state(&config, graph, seed)?;
    let sampler = Sampler::new(
        graph,
        state,
        config.moves.death_rule,
        determinism::epoch_seed(seed, 0),
    )?;
    info!(
        "starting run: {} nodes, {} edges, {} initial levels, {} iterations, seed {seed}",
        graph.num_nodes(),
        graph.num_edges(),
        sampler.state().num_groups(),
        config.iterations
    );
    drive(
        &config,
        seed,
        graph_hash(graph),
        sampler,
        0,
        Vec::new(),
        config.saved_data_name.clone(),
    )
}

/// Resumes a run from a checkpoint file on the same graph.
///
/// The resumed segment writes its snapshots under the prefix
/// `{saved_data_name}_from_{iteration}`.
pub fn resume(path: &Path, graph: &AdjacencyGraph) -> Result<RunSummary, HcpError> {
    let payload = CheckpointPayload::load(path)?;
    let hash = graph_hash(graph);
    if hash != payload.graph_hash {
        return Err(HcpError::Graph(
            ErrorInfo::new("checkpoint-graph-mismatch", "graph differs from the checkpointed one")
                .with_context("path", path.display().to_string())
                .with_context("expected", payload.graph_hash.clone())
                .with_context("found", hash),
        ));
    }
    let config = payload.config.validate()?;
    let state = GroupState::from_masks(
        graph,
        payload.masks,
        payload.num_groups,
        config.max_num_groups,
    )?;
    let mut sampler = Sampler::new(
        graph,
        state,
        config.moves.death_rule,
        determinism::epoch_seed(payload.master_seed, 0),
    )?;
    let drift = (sampler.log_likelihood() - payload.log_likelihood).abs();
    if drift > 1e-9 * payload.log_likelihood.abs().max(1.0) {
        return Err(HcpError::Serde(
            ErrorInfo::new(
                "checkpoint-likelihood-mismatch",
                "stored log-likelihood disagrees with the restored state",
            )
            .with_context("path", path.display().to_string())
            .with_context("stored", payload.log_likelihood.to_string())
            .with_context("recomputed", sampler.log_likelihood().to_string()),
        ));
    }
    sampler.stats = payload.stats;
    let completed_epochs = payload.iteration / config.epoch_length;
    let checkpoints = checkpoint::existing_checkpoints(
        &checkpoint_directory(&config),
        completed_epochs,
    )?;
    info!(
        "resuming from {} at iteration {} of {}",
        path.display(),
        payload.iteration,
        config.iterations
    );
    let prefix = format!("{}_from_{}", config.saved_data_name, payload.iteration);
    drive(
        &config,
        payload.master_seed,
        hash,
        sampler,
        payload.iteration,
        checkpoints,
        prefix,
    )
}

fn checkpoint_directory(config: &RunConfig) -> PathBuf {
    config.output_directory().join("checkpoints")
}

fn drive(
    config: &RunConfig,
    seed: u64,
    graph_hash: String,
    mut sampler: Sampler<&AdjacencyGraph>,
    start_iteration: u64,
    mut checkpoints: Vec<PathBuf>,
    prefix: String,
) -> Result<RunSummary, HcpError> {
    let out_dir = config.output_directory();
    let checkpoint_dir = checkpoint_directory(config);
    let mut writer = SnapshotWriter::create(&out_dir, &prefix)?;

    for iteration in start_iteration..config.iterations {
        if iteration % config.epoch_length == 0 {
            let epoch = determinism::epoch_of(iteration, config.epoch_length);
            sampler.begin_epoch(determinism::epoch_seed(seed, epoch));
            debug!("epoch {epoch} begins at iteration {iteration}");
        }

        sampler.step();

        if iteration > config.snapshots.burn_in && iteration % config.snapshots.thinning == 0 {
            let stats = sampler.stats();
            writer.record(
                &sampler.snapshot(iteration),
                stats.total_accepted(),
                stats.total_proposed(),
            )?;
        }

        if iteration % config.report_interval == 0 {
            report(iteration, &sampler);
        }

        let completed = iteration + 1;
        if config.checkpoint.interval > 0 && completed % config.epoch_length == 0 {
            let epochs = completed / config.epoch_length;
            if epochs % config.checkpoint.interval == 0 {
                let path = checkpoint::checkpoint_path(&checkpoint_dir, epochs);
                CheckpointPayload {
                    schema_version: Default::default(),
                    iteration: completed,
                    config: config.clone(),
                    master_seed: seed,
                    graph_hash: graph_hash.clone(),
                    num_groups: sampler.state().num_groups(),
                    masks: sampler.state().masks().to_vec(),
                    log_likelihood: sampler.log_likelihood(),
                    stats: sampler.stats().clone(),
                }
                .store(&path)?;
                debug!("checkpoint written to {}", path.display());
                checkpoints.push(path);
                checkpoint::enforce_retention(&mut checkpoints, config.checkpoint.max_to_keep)?;
            }
        }
    }

    let snapshots_written = writer.written();
    let outputs = writer.finish()?;
    let iterations = config.iterations.max(start_iteration);
    let state = sampler.state();
    let summary_state_hash = state.canonical_hash();

    let manifest_path = out_dir.join(format!("{prefix}_manifest.json"));
    RunManifest {
        schema_version: Default::default(),
        config: config.clone(),
        seed_label: config.seed_policy.label.clone(),
        provenance: manifest::provenance(&graph_hash, seed),
        start_iteration,
        iterations,
        final_state_hash: summary_state_hash.clone(),
        final_log_likelihood: sampler.log_likelihood(),
        final_num_groups: state.num_groups(),
        snapshots_written,
        outputs: outputs.clone(),
        checkpoints: checkpoints.clone(),
    }
    .write(&manifest_path)?;

    info!(
        "finished at iteration {iterations}: loglike {:.6}, {} levels, {snapshots_written} snapshots",
        sampler.log_likelihood(),
        state.num_groups()
    );

    Ok(RunSummary {
        start_iteration,
        iterations,
        acceptance_rates: sampler.stats().acceptance_rates(),
        final_log_likelihood: sampler.log_likelihood(),
        final_num_groups: state.num_groups(),
        final_state_hash: summary_state_hash,
        graph_hash,
        snapshots_written,
        outputs,
        manifest_path,
        checkpoints,
    })
}

fn report<N: Network>(iteration: u64, sampler: &Sampler<N>) {
    let state = sampler.state();
    info!(
        "iteration {iteration}: loglike {:.6}, {} levels",
        sampler.log_likelihood(),
        state.num_groups()
    );
    debug!(
        "hcg_pairs {:?} hcg_edges {:?} group_size {:?}",
        state.hcg_pairs(),
        state.hcg_edges(),
        state.group_size()
    );
}
