use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use hcp_core::errors::ErrorInfo;
use hcp_core::HcpError;
use serde::{Deserialize, Serialize};

use crate::levels::GroupMask;

/// Read-only view of the chain between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Zero-based index of the step just taken; `iteration + 1` steps have
    /// completed.
    pub iteration: u64,
    /// Active number of levels.
    pub num_groups: usize,
    /// Group mask of every node.
    pub masks: Vec<GroupMask>,
    /// Nodes per level.
    pub group_size: Vec<u64>,
    /// Pairs per hierarchical consensus group.
    pub hcg_pairs: Vec<u64>,
    /// Edges per hierarchical consensus group.
    pub hcg_edges: Vec<u64>,
    /// Marginal log-likelihood of the state.
    pub log_likelihood: f64,
}

/// One row of the CSV trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRow {
    /// Zero-based step index, as in [`Snapshot::iteration`].
    pub iteration: u64,
    /// Log-likelihood at that iteration.
    pub log_likelihood: f64,
    /// Active levels at that iteration.
    pub num_groups: usize,
    /// Proposals accepted so far.
    pub accepted: u64,
    /// Proposals drawn so far, forced no-ops included.
    pub proposed: u64,
}

/// Files produced by a [`SnapshotWriter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPaths {
    /// Node masks, one snapshot per line.
    pub configs: PathBuf,
    /// Level count, one per line.
    pub num_groups: PathBuf,
    /// Group sizes, one snapshot per line.
    pub group_size: PathBuf,
    /// Edge buckets, one snapshot per line.
    pub edges: PathBuf,
    /// Pair buckets, one snapshot per line.
    pub pairs: PathBuf,
    /// Log-likelihood, one per line.
    pub log_likelihood: PathBuf,
    /// CSV trace.
    pub trace: PathBuf,
}

impl OutputPaths {
    /// Paths for output prefix `name` inside `dir`.
    pub fn new(dir: &Path, name: &str) -> Self {
        let file = |suffix: &str| dir.join(format!("{name}_{suffix}"));
        Self {
            configs: file("configs.txt"),
            num_groups: file("num_groups.txt"),
            group_size: file("group_size.txt"),
            edges: file("edges.txt"),
            pairs: file("pairs.txt"),
            log_likelihood: file("ll.txt"),
            trace: file("trace.csv"),
        }
    }
}

/// Streams snapshots to the delimited text files and the CSV trace.
pub struct SnapshotWriter {
    paths: OutputPaths,
    configs: BufWriter<File>,
    num_groups: BufWriter<File>,
    group_size: BufWriter<File>,
    edges: BufWriter<File>,
    pairs: BufWriter<File>,
    log_likelihood: BufWriter<File>,
    trace: csv::Writer<File>,
    written: u64,
}

impl SnapshotWriter {
    /// Creates (truncating) every output file, creating `dir` if needed.
    pub fn create(dir: &Path, name: &str) -> Result<Self, HcpError> {
        fs::create_dir_all(dir).map_err(|err| HcpError::io("output-mkdir", dir, err))?;
        let paths = OutputPaths::new(dir, name);
        let open = |path: &Path| {
            File::create(path)
                .map(BufWriter::new)
                .map_err(|err| HcpError::io("output-create", path, err))
        };
        let trace = csv::Writer::from_path(&paths.trace).map_err(|err| {
            HcpError::Serde(
                ErrorInfo::new("trace-create", err.to_string())
                    .with_context("path", paths.trace.display().to_string()),
            )
        })?;
        Ok(Self {
            configs: open(&paths.configs)?,
            num_groups: open(&paths.num_groups)?,
            group_size: open(&paths.group_size)?,
            edges: open(&paths.edges)?,
            pairs: open(&paths.pairs)?,
            log_likelihood: open(&paths.log_likelihood)?,
            trace,
            paths,
            written: 0,
        })
    }

    /// Appends one snapshot together with the running move totals.
    pub fn record(
        &mut self,
        snapshot: &Snapshot,
        accepted: u64,
        proposed: u64,
    ) -> Result<(), HcpError> {
        write_row(&mut self.configs, &self.paths.configs, &snapshot.masks)?;
        writeln!(self.num_groups, "{}", snapshot.num_groups)
            .map_err(|err| HcpError::io("output-write", &self.paths.num_groups, err))?;
        write_row(&mut self.group_size, &self.paths.group_size, &snapshot.group_size)?;
        write_row(&mut self.edges, &self.paths.edges, &snapshot.hcg_edges)?;
        write_row(&mut self.pairs, &self.paths.pairs, &snapshot.hcg_pairs)?;
        writeln!(self.log_likelihood, "{}", snapshot.log_likelihood)
            .map_err(|err| HcpError::io("output-write", &self.paths.log_likelihood, err))?;
        self.trace
            .serialize(TraceRow {
                iteration: snapshot.iteration,
                log_likelihood: snapshot.log_likelihood,
                num_groups: snapshot.num_groups,
                accepted,
                proposed,
            })
            .map_err(|err| wrap_csv(&self.paths.trace, err))?;
        self.written += 1;
        Ok(())
    }

    /// Number of snapshots written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes every file and returns their paths.
    pub fn finish(mut self) -> Result<OutputPaths, HcpError> {
        let paths = &self.paths;
        for (writer, path) in [
            (&mut self.configs, &paths.configs),
            (&mut self.num_groups, &paths.num_groups),
            (&mut self.group_size, &paths.group_size),
            (&mut self.edges, &paths.edges),
            (&mut self.pairs, &paths.pairs),
            (&mut self.log_likelihood, &paths.log_likelihood),
        ] {
            writer
                .flush()
                .map_err(|err| HcpError::io("output-flush", path, err))?;
        }
        self.trace
            .flush()
            .map_err(|err| HcpError::io("output-flush", &paths.trace, err))?;
        Ok(self.paths)
    }
}

fn write_row<T: std::fmt::Display>(
    writer: &mut BufWriter<File>,
    path: &Path,
    values: &[T],
) -> Result<(), HcpError> {
    let mut line = String::new();
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            line.push(' ');
        }
        line.push_str(&value.to_string());
    }
    writeln!(writer, "{line}").map_err(|err| HcpError::io("output-write", path, err))
}

fn wrap_csv(path: &Path, err: csv::Error) -> HcpError {
    HcpError::Serde(
        ErrorInfo::new("trace-write", "CSV trace failure")
            .with_context("path", path.display().to_string())
            .with_hint(err.to_string()),
    )
}
