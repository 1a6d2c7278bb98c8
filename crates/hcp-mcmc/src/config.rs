use std::fs;
use std::path::{Path, PathBuf};

use hcp_core::errors::ErrorInfo;
use hcp_core::HcpError;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};

use crate::levels::{GroupMask, MAX_LEVELS};
use crate::moves::DeathRule;

/// YAML-configurable parameters of a sampling run.
///
/// Plain `key: value` parameter files are valid YAML and load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Iteration budget.
    #[serde(alias = "max_itr", default = "default_iterations")]
    pub iterations: u64,
    /// Ceiling on the number of levels, in `[1, 64]`.
    #[serde(default = "default_max_num_groups")]
    pub max_num_groups: usize,
    /// Number of levels at the start of the chain.
    #[serde(default = "default_initial_num_groups")]
    pub initial_num_groups: usize,
    /// Explicit initial masks; a YAML list or a whitespace separated string.
    #[serde(
        default,
        deserialize_with = "deserialize_masks",
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_group_config: Option<Vec<GroupMask>>,
    /// Graph file (GML, or whitespace edge list for other extensions).
    #[serde(default)]
    pub gml_path: Option<PathBuf>,
    /// Prefix of every output file.
    #[serde(default = "default_saved_data_name")]
    pub saved_data_name: String,
    /// Output directory; the working directory when absent.
    #[serde(default)]
    pub save_directory: Option<PathBuf>,
    /// Snapshot schedule.
    #[serde(default)]
    pub snapshots: SnapshotConfig,
    /// Iterations between progress reports.
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,
    /// Iterations sharing one RNG substream.
    #[serde(default = "default_epoch_length")]
    pub epoch_length: u64,
    /// Checkpointing behaviour.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    /// Move set options.
    #[serde(default)]
    pub moves: MoveConfig,
    /// Master seed and label.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
}

fn default_iterations() -> u64 {
    1_000_000_000
}

fn default_max_num_groups() -> usize {
    MAX_LEVELS
}

fn default_initial_num_groups() -> usize {
    2
}

fn default_saved_data_name() -> String {
    "data".to_string()
}

fn default_report_interval() -> u64 {
    10_000_000
}

fn default_epoch_length() -> u64 {
    1_000_000
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            max_num_groups: default_max_num_groups(),
            initial_num_groups: default_initial_num_groups(),
            initial_group_config: None,
            gml_path: None,
            saved_data_name: default_saved_data_name(),
            save_directory: None,
            snapshots: SnapshotConfig::default(),
            report_interval: default_report_interval(),
            epoch_length: default_epoch_length(),
            checkpoint: CheckpointConfig::default(),
            moves: MoveConfig::default(),
            seed_policy: SeedPolicy::default(),
        }
    }
}

/// When snapshots are recorded: iteration `i` is kept if
/// `i > burn_in && i % thinning == 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Iterations discarded before snapshots start.
    #[serde(default = "default_burn_in")]
    pub burn_in: u64,
    /// Spacing between snapshots.
    #[serde(default = "default_thinning")]
    pub thinning: u64,
}

fn default_burn_in() -> u64 {
    10_000_000
}

fn default_thinning() -> u64 {
    1500
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            burn_in: default_burn_in(),
            thinning: default_thinning(),
        }
    }
}

/// Checkpointing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Epochs between checkpoint writes (0 disables checkpoints).
    #[serde(default)]
    pub interval: u64,
    /// Maximum number of checkpoints to retain.
    #[serde(default = "default_checkpoint_retention")]
    pub max_to_keep: usize,
}

fn default_checkpoint_retention() -> usize {
    4
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            interval: 0,
            max_to_keep: default_checkpoint_retention(),
        }
    }
}

/// Move set options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveConfig {
    /// When an empty level is proposed for death.
    #[serde(default)]
    pub death_rule: DeathRule,
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded in the manifest.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0x05EE_D5EE_DD15_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaskList {
    List(Vec<GroupMask>),
    Single(GroupMask),
    Text(String),
}

fn deserialize_masks<'de, D>(deserializer: D) -> Result<Option<Vec<GroupMask>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<MaskList>::deserialize(deserializer)? {
        None => Ok(None),
        Some(MaskList::List(masks)) => Ok(Some(masks)),
        Some(MaskList::Single(mask)) => Ok(Some(vec![mask])),
        Some(MaskList::Text(text)) => text
            .split_whitespace()
            .map(|token| {
                token.parse::<GroupMask>().map_err(|_| {
                    serde::de::Error::custom(format!("invalid group mask `{token}`"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|masks| (!masks.is_empty()).then_some(masks)),
    }
}

impl RunConfig {
    /// Parses a YAML document.
    pub fn from_yaml_str(contents: &str) -> Result<Self, HcpError> {
        serde_yaml::from_str(contents).map_err(|err| {
            HcpError::Config(ErrorInfo::new("config-parse", err.to_string()))
        })
    }

    /// Reads and parses a YAML file.
    pub fn load(path: &Path) -> Result<Self, HcpError> {
        let contents =
            fs::read_to_string(path).map_err(|err| HcpError::io("config-read", path, err))?;
        Self::from_yaml_str(&contents).map_err(|err| match err {
            HcpError::Config(info) => {
                HcpError::Config(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Checks the configuration and returns the effective copy.
    ///
    /// An `initial_num_groups` above `max_num_groups` is replaced by the
    /// default, capped at `max_num_groups`.
    pub fn validate(&self) -> Result<Self, HcpError> {
        let invalid =
            |code: &str, message: &str, field: &str, value: String| -> Result<Self, HcpError> {
                Err(HcpError::Config(
                    ErrorInfo::new(code, message).with_context(field, value),
                ))
            };
        if self.iterations == 0 {
            return invalid(
                "invalid-iterations",
                "iteration budget must be positive",
                "iterations",
                self.iterations.to_string(),
            );
        }
        if self.max_num_groups == 0 || self.max_num_groups > MAX_LEVELS {
            return invalid(
                "invalid-max-groups",
                "max_num_groups must lie in [1, 64]",
                "max_num_groups",
                self.max_num_groups.to_string(),
            );
        }
        if self.initial_num_groups == 0 || self.initial_num_groups > MAX_LEVELS {
            return invalid(
                "invalid-initial-groups",
                "initial_num_groups must lie in [1, 64]",
                "initial_num_groups",
                self.initial_num_groups.to_string(),
            );
        }
        if self.epoch_length == 0 {
            return invalid(
                "invalid-epoch-length",
                "epoch_length must be positive",
                "epoch_length",
                self.epoch_length.to_string(),
            );
        }
        if self.snapshots.thinning == 0 {
            return invalid(
                "invalid-thinning",
                "snapshot thinning must be positive",
                "thinning",
                self.snapshots.thinning.to_string(),
            );
        }
        if self.report_interval == 0 {
            return invalid(
                "invalid-report-interval",
                "report_interval must be positive",
                "report_interval",
                self.report_interval.to_string(),
            );
        }
        if self.checkpoint.interval > 0 && self.checkpoint.max_to_keep == 0 {
            return invalid(
                "invalid-checkpoint-retention",
                "checkpoints are enabled but max_to_keep is zero",
                "max_to_keep",
                self.checkpoint.max_to_keep.to_string(),
            );
        }
        let mut effective = self.clone();
        if effective.initial_num_groups > effective.max_num_groups {
            let fallback = default_initial_num_groups().min(effective.max_num_groups);
            warn!(
                "initial_num_groups {} exceeds max_num_groups {}; using {}",
                effective.initial_num_groups, effective.max_num_groups, fallback
            );
            effective.initial_num_groups = fallback;
        }
        Ok(effective)
    }

    /// Graph file named by the configuration.
    pub fn graph_path(&self) -> Result<&Path, HcpError> {
        self.gml_path.as_deref().ok_or_else(|| {
            HcpError::Config(
                ErrorInfo::new("missing-graph", "no network specified")
                    .with_hint("set gml_path in the config or pass --graph"),
            )
        })
    }

    /// Directory receiving the run outputs.
    pub fn output_directory(&self) -> PathBuf {
        self.save_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
