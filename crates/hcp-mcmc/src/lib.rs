#![deny(missing_docs)]
//! Reversible-jump MCMC over hierarchical consensus partitions.
//!
//! Every node carries a bitmask of the nested groups (levels) it belongs to;
//! level 0 is the root and contains everyone. A pair of nodes is filed under
//! the deepest level both share, and the state is scored by a Beta-Bernoulli
//! marginal likelihood of edges per level. The [`kernel::Sampler`] adds and
//! removes nodes from levels and opens or closes empty levels, keeping all
//! sufficient statistics incrementally up to date.

/// Checkpoint payloads written at epoch boundaries.
pub mod checkpoint;
/// YAML configuration schema, defaults and validation.
pub mod config;
/// Deterministic seed derivation helpers.
pub mod determinism;
/// Sampler, `run` and `resume` entry points.
pub mod kernel;
/// Bit-level helpers for group masks.
pub mod levels;
/// Log-factorial table and the marginal likelihood.
pub mod likelihood;
/// Run manifest serialization.
pub mod manifest;
/// Per-level member / non-member index.
pub mod membership;
/// Snapshot records and output writers.
pub mod metrics;
/// Proposal generation, application and rollback.
pub mod moves;
/// Group assignments and level counters.
pub mod state;

pub use config::{CheckpointConfig, MoveConfig, RunConfig, SeedPolicy, SnapshotConfig};
pub use kernel::{
    initial_state, resume, run, MoveCount, MoveStats, ProposalOutcome, RunSummary, Sampler,
};
pub use levels::GroupMask;
pub use likelihood::{LikelihoodBreakdown, LogFactorialTable};
pub use manifest::RunManifest;
pub use metrics::{OutputPaths, Snapshot};
pub use moves::{DeathRule, MoveKind, Proposal};
pub use state::{GroupState, LevelCounts};
