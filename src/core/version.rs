//! Version tracking through commit metadata.
//!
//! Each commit stores a [`CommitRecord`] as the tantivy commit payload,
//! so the version of a commit becomes durable in the same step as the
//! documents it covers. The [`VersionTracker`] remembers the record of
//! the latest commit made (or found at start) by a writer handle.

use crate::core::error::{IngestError, Result};
use crate::core::types::VersionToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Commit metadata key carrying the version token
pub const VERSION_KEY: &str = "version";

/// Metadata persisted with every commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Version of the last event of the committed batch
    pub version: VersionToken,

    /// Engine opstamp of the commit
    #[serde(default)]
    pub sequence: u64,

    /// Wall-clock time the commit was prepared
    #[serde(default)]
    pub committed_at: Option<DateTime<Utc>>,
}

impl CommitRecord {
    pub fn new(version: VersionToken, sequence: u64) -> Self {
        Self {
            version,
            sequence,
            committed_at: Some(Utc::now()),
        }
    }

    /// Encode as a commit payload
    pub fn to_payload(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a commit payload
    ///
    /// Payloads without a `version` key (or not JSON at all) decode to
    /// `None`; they were not written by this crate.
    pub fn from_payload(payload: &str) -> Option<Self> {
        match serde_json::from_str::<CommitRecord>(payload) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(
                    "Ignoring commit payload without a '{}' entry: {}",
                    VERSION_KEY,
                    e
                );
                None
            }
        }
    }
}

/// Tracks the last committed record of one writer handle
#[derive(Debug, Default)]
pub struct VersionTracker {
    last_committed: RwLock<Option<CommitRecord>>,
}

impl VersionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the payload of the last durable commit
    pub fn load(&self, payload: Option<&str>) -> Result<Option<CommitRecord>> {
        let record = payload.and_then(CommitRecord::from_payload);
        self.set(record.clone())?;
        Ok(record)
    }

    /// Record a successful commit
    pub fn record(&self, record: CommitRecord) -> Result<()> {
        self.set(Some(record))
    }

    /// Record of the latest successful commit, if any
    pub fn last_committed(&self) -> Option<CommitRecord> {
        self.last_committed
            .read()
            .map(|guard| (*guard).clone())
            .unwrap_or_else(|poisoned| (*poisoned.into_inner()).clone())
    }

    /// Version of the latest successful commit, if any
    pub fn committed_version(&self) -> Option<VersionToken> {
        self.last_committed().map(|record| record.version)
    }

    fn set(&self, record: Option<CommitRecord>) -> Result<()> {
        let mut guard = self
            .last_committed
            .write()
            .map_err(|e| IngestError::CommitFailed(format!("Version tracker poisoned: {e}")))?;
        *guard = record;
        Ok(())
    }
}
