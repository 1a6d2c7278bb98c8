use std::fs;
use std::path::{Path, PathBuf};

use hcp_core::errors::ErrorInfo;
use hcp_core::{HcpError, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::kernel::MoveStats;
use crate::levels::GroupMask;

/// Chain state written at an epoch boundary.
///
/// The RNG is not stored: the next epoch reseeds from the master seed, so
/// masks plus iteration count are enough to continue bit-identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointPayload {
    /// Payload schema.
    #[serde(default)]
    pub schema_version: SchemaVersion,
    /// Iterations completed when the checkpoint was written.
    pub iteration: u64,
    /// Effective configuration of the run.
    pub config: RunConfig,
    /// Master seed of the run.
    pub master_seed: u64,
    /// Canonical hash of the graph the chain runs on.
    pub graph_hash: String,
    /// Active level count.
    pub num_groups: usize,
    /// Node masks.
    pub masks: Vec<GroupMask>,
    /// Log-likelihood at the checkpoint.
    pub log_likelihood: f64,
    /// Move counters accumulated so far.
    pub stats: MoveStats,
}

impl CheckpointPayload {
    /// Restores the payload from disk.
    pub fn load(path: &Path) -> Result<Self, HcpError> {
        let contents =
            fs::read_to_string(path).map_err(|err| HcpError::io("checkpoint-read", path, err))?;
        let payload: Self = serde_json::from_str(&contents).map_err(|err| {
            HcpError::Serde(
                ErrorInfo::new("checkpoint-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        if !payload.schema_version.is_readable() {
            return Err(HcpError::Serde(
                ErrorInfo::new("schema-mismatch", "unsupported checkpoint schema version")
                    .with_context("path", path.display().to_string())
                    .with_context("found", payload.schema_version.to_string()),
            ));
        }
        Ok(payload)
    }

    /// Writes the payload to disk, creating parent directories.
    pub fn store(&self, path: &Path) -> Result<(), HcpError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| HcpError::io("checkpoint-mkdir", parent, err))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            HcpError::Serde(
                ErrorInfo::new("checkpoint-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| HcpError::io("checkpoint-write", path, err))
    }
}

/// Checkpoint file for the given number of completed epochs.
pub fn checkpoint_path(root: &Path, epoch: u64) -> PathBuf {
    root.join(format!("ckpt_{epoch:05}.json"))
}

/// Checkpoints in `root` covering at most `up_to_epoch` epochs, oldest first.
/// A missing directory yields an empty list.
pub fn existing_checkpoints(root: &Path, up_to_epoch: u64) -> Result<Vec<PathBuf>, HcpError> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(HcpError::io("checkpoint-list", root, err)),
    };
    let mut found = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| HcpError::io("checkpoint-list", root, err))?
            .path();
        let epoch = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix("ckpt_"))
            .and_then(|name| name.strip_suffix(".json"))
            .and_then(|digits| digits.parse::<u64>().ok());
        if let Some(epoch) = epoch.filter(|&epoch| epoch <= up_to_epoch) {
            found.push((epoch, path));
        }
    }
    found.sort();
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

/// Deletes the oldest checkpoints until at most `max_to_keep` remain.
pub fn enforce_retention(paths: &mut Vec<PathBuf>, max_to_keep: usize) -> Result<(), HcpError> {
    while paths.len() > max_to_keep {
        let oldest = paths.remove(0);
        fs::remove_file(&oldest).map_err(|err| HcpError::io("checkpoint-remove", &oldest, err))?;
    }
    Ok(())
}
