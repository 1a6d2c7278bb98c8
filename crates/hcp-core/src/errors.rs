//! Error vocabulary of the sampler crates.
//!
//! Every failure is one of four families and carries a stable kebab-case
//! code plus free-form context, so callers can match on codes and the CLI can
//! print a readable one-liner.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code, message and context of an [`HcpError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable kebab-case code such as `duplicate-edge`.
    pub code: String,
    /// Human readable message.
    pub message: String,
    /// Offending values keyed by name (node ids, sizes, paths).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Suggested fix, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with no context and no hint.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Records one context value.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attaches a hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        let mut entries = self.context.iter();
        if let Some((key, value)) = entries.next() {
            write!(f, " ({key}={value}")?;
            for (key, value) in entries {
                write!(f, ", {key}={value}")?;
            }
            write!(f, ")")?;
        }
        match &self.hint {
            Some(hint) => write!(f, "; hint: {hint}"),
            None => Ok(()),
        }
    }
}

/// Error type shared by the graph, sampler and CLI crates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum HcpError {
    /// Malformed or unsupported graph input.
    #[error("graph error: {0}")]
    Graph(ErrorInfo),
    /// Rejected run configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Invalid group assignment or inconsistent chain state.
    #[error("model error: {0}")]
    Model(ErrorInfo),
    /// Filesystem, (de)serialisation and schema failures.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl HcpError {
    /// Payload of the error, whatever its family.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            HcpError::Graph(info)
            | HcpError::Config(info)
            | HcpError::Model(info)
            | HcpError::Serde(info) => info,
        }
    }

    /// Stable code of the error.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Wraps an I/O failure on `path` as a [`HcpError::Serde`] error.
    pub fn io(code: &str, path: &Path, err: std::io::Error) -> Self {
        HcpError::Serde(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    }
}
