//! Schema versions and run provenance recorded in persisted artifacts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// `major.minor.patch` version of a persisted payload layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Bumped when older readers can no longer load the payload.
    pub major: u32,
    /// Bumped for additive fields.
    pub minor: u32,
    /// Bumped for fixes that leave the layout alone.
    pub patch: u32,
}

impl SchemaVersion {
    /// Layout written by this build.
    pub const CURRENT: SchemaVersion = SchemaVersion::new(1, 0, 0);

    /// Builds a version triple.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Whether a payload written under `self` can be read by this build.
    pub fn is_readable(&self) -> bool {
        self.major == Self::CURRENT.major
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Where a run's artifacts came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Canonical hash of the graph the chain ran on.
    pub graph_hash: String,
    /// Master seed of the run.
    pub seed: u64,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// Crate name to version of the tools that produced the artifact.
    pub tool_versions: BTreeMap<String, String>,
}
