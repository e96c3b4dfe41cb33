//! Core data types shared across the ingestion core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, caller-defined version token
///
/// The ingestion core never interprets ordering; it only records the
/// token of each committed batch and hands it back to readers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VersionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One domain event handed to the consumer
#[derive(Debug, Clone, PartialEq)]
pub struct DataEvent<D> {
    pub payload: D,
    pub version: Option<VersionToken>,
}

impl<D> DataEvent<D> {
    /// Create an event carrying a version
    pub fn new(payload: D, version: impl Into<VersionToken>) -> Self {
        Self {
            payload,
            version: Some(version.into()),
        }
    }

    /// Create an event without a version
    pub fn unversioned(payload: D) -> Self {
        Self {
            payload,
            version: None,
        }
    }
}

/// Lifecycle of a writer handle
///
/// `Shutdown` is terminal. Mutations and commits are only accepted in
/// `Started`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriterState {
    Unstarted,
    Started,
    Shutdown,
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriterState::Unstarted => "unstarted",
            WriterState::Started => "started",
            WriterState::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

/// Summary of one consumed batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Events in the batch
    pub events: usize,

    /// Events whose indexable was marked skip
    pub skipped: usize,

    /// Uids retracted before re-insertion
    pub retracted: usize,

    /// Documents inserted
    pub inserted: usize,

    /// Version recorded by the batch commit (`None` if nothing committed)
    pub committed_version: Option<VersionToken>,

    /// Processing time in milliseconds
    pub duration_ms: u64,
}
