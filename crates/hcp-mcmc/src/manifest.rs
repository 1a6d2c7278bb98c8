use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use hcp_core::errors::ErrorInfo;
use hcp_core::{HcpError, RunProvenance, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::metrics::OutputPaths;

/// JSON record describing a finished run segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Manifest schema.
    #[serde(default)]
    pub schema_version: SchemaVersion,
    /// Effective configuration.
    pub config: RunConfig,
    /// Seed label captured from the configuration.
    pub seed_label: Option<String>,
    /// Graph hash, seed, timestamp and tool versions.
    pub provenance: RunProvenance,
    /// First iteration of this segment (non-zero after a resume).
    pub start_iteration: u64,
    /// Iterations completed at the end of the segment.
    pub iterations: u64,
    /// Canonical hash of the final state.
    pub final_state_hash: String,
    /// Log-likelihood of the final state.
    pub final_log_likelihood: f64,
    /// Level count of the final state.
    pub final_num_groups: usize,
    /// Snapshots written by this segment.
    pub snapshots_written: u64,
    /// Output files of this segment.
    pub outputs: OutputPaths,
    /// Checkpoints still on disk.
    pub checkpoints: Vec<PathBuf>,
}

/// Provenance block for a run on `graph_hash` seeded with `seed`.
pub fn provenance(graph_hash: &str, seed: u64) -> RunProvenance {
    let mut tool_versions = BTreeMap::new();
    tool_versions.insert(
        env!("CARGO_PKG_NAME").to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    RunProvenance {
        graph_hash: graph_hash.to_string(),
        seed,
        created_at: chrono::Utc::now().to_rfc3339(),
        tool_versions,
    }
}

impl RunManifest {
    /// Writes the manifest as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<(), HcpError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| HcpError::io("manifest-mkdir", parent, err))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            HcpError::Serde(
                ErrorInfo::new("manifest-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| HcpError::io("manifest-write", path, err))
    }

    /// Loads a manifest from disk.
    pub fn load(path: &Path) -> Result<Self, HcpError> {
        let contents =
            fs::read_to_string(path).map_err(|err| HcpError::io("manifest-read", path, err))?;
        serde_json::from_str(&contents).map_err(|err| {
            HcpError::Serde(
                ErrorInfo::new("manifest-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}
