//! Snapshot reader provider.
//!
//! Opens read-only, point-in-time views over the writer's committed
//! state. Each view carries the [`CommitRecord`] that was current when
//! the view was published, so the version a reader observes always
//! matches the documents it sees.

use crate::core::error::{IngestError, Result};
use crate::core::storage::IndexWriterHandle;
use crate::core::types::VersionToken;
use crate::core::version::CommitRecord;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, RwLock};
use tantivy::collector::DocSetCollector;
use tantivy::query::TermQuery;
use tantivy::schema::{Field, IndexRecordOption, Term};
use tantivy::{Searcher, TantivyDocument};

/// Ordering strategy over version tokens
pub type VersionComparator = Box<dyn Fn(&VersionToken, &VersionToken) -> Ordering + Send + Sync>;

/// Reader-side contract exposed to query consumers
pub trait IndexReaderFactory {
    type Reader;

    /// Open readers over the latest committed state
    fn get_readers(&self) -> Result<Vec<Self::Reader>>;

    /// Give readers back; never fails
    fn return_readers(&self, readers: Vec<Self::Reader>);

    /// Version recorded by the most recently opened readers
    fn current_reader_version(&self) -> Option<VersionToken>;

    /// Version of this source as a whole
    fn version(&self) -> Result<VersionToken>;

    /// Ordering of version tokens
    fn version_comparator(&self) -> Result<VersionComparator>;
}

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(1);

/// Outstanding-reader accounting for one provider
#[derive(Debug)]
struct ReaderLedger {
    provider_id: u64,
    open: AtomicUsize,
}

/// An opened, immutable snapshot of the index
pub struct ReaderHandle {
    searcher: Searcher,
    record: Option<CommitRecord>,
    uid_field: Field,
    ledger: Arc<ReaderLedger>,
    released: bool,
}

impl std::fmt::Debug for ReaderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderHandle")
            .field("record", &self.record)
            .field("num_docs", &self.searcher.num_docs())
            .finish()
    }
}

impl ReaderHandle {
    /// Searcher over the snapshot
    pub fn searcher(&self) -> &Searcher {
        &self.searcher
    }

    /// Version recorded by the commit this snapshot reflects
    pub fn version(&self) -> Option<&VersionToken> {
        self.record.as_ref().map(|record| &record.version)
    }

    /// Commit record this snapshot reflects
    pub fn commit_record(&self) -> Option<&CommitRecord> {
        self.record.as_ref()
    }

    /// Live documents in the snapshot
    pub fn num_docs(&self) -> u64 {
        self.searcher.num_docs()
    }

    /// Stored documents carrying `uid`, in index order
    pub fn lookup(&self, uid: &str) -> Result<Vec<TantivyDocument>> {
        let query = TermQuery::new(
            Term::from_field_text(self.uid_field, uid),
            IndexRecordOption::Basic,
        );

        let mut addresses: Vec<_> = self
            .searcher
            .search(&query, &DocSetCollector)
            .map_err(|e| IngestError::ReaderOpenFailed(format!("Lookup failed: {e}")))?
            .into_iter()
            .collect();
        addresses.sort();

        addresses
            .into_iter()
            .map(|address| {
                self.searcher.doc::<TantivyDocument>(address).map_err(|e| {
                    IngestError::ReaderOpenFailed(format!("Failed to load document: {e}"))
                })
            })
            .collect()
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.ledger.open.fetch_sub(1, AtomicOrdering::AcqRel);
        if !self.released {
            tracing::debug!("Reader dropped without being released");
        }
    }
}

/// Readers opened together, with the version they reflect
#[derive(Debug, Default)]
pub struct ReaderSet {
    pub readers: Vec<ReaderHandle>,
    pub version: Option<VersionToken>,
}

impl ReaderSet {
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Total live documents across the readers
    pub fn num_docs(&self) -> u64 {
        self.readers.iter().map(ReaderHandle::num_docs).sum()
    }
}

/// Opens consistent snapshots over a writer's committed state
pub struct SnapshotReaderProvider {
    writer: Arc<IndexWriterHandle>,
    ledger: Arc<ReaderLedger>,
    last_opened: RwLock<Option<CommitRecord>>,
}

impl SnapshotReaderProvider {
    pub fn new(writer: Arc<IndexWriterHandle>) -> Self {
        Self {
            writer,
            ledger: Arc::new(ReaderLedger {
                provider_id: NEXT_PROVIDER_ID.fetch_add(1, AtomicOrdering::Relaxed),
                open: AtomicUsize::new(0),
            }),
            last_opened: RwLock::new(None),
        }
    }

    /// Open one snapshot over the latest committed state
    ///
    /// Returns an empty set when the writer is not started. Never waits
    /// for in-flight mutations or commits.
    pub fn open_readers(&self) -> Result<ReaderSet> {
        let Some(published) = self.writer.published_snapshot()? else {
            tracing::debug!("Writer not started; no readers to open");
            return Ok(ReaderSet::default());
        };

        let uid_field = self
            .writer
            .uid_field()
            .map_err(|e| IngestError::ReaderOpenFailed(e.to_string()))?;

        if let Some(record) = &published.record {
            self.observe(record);
        }

        self.ledger.open.fetch_add(1, AtomicOrdering::AcqRel);
        let version = published.record.as_ref().map(|r| r.version.clone());
        let handle = ReaderHandle {
            searcher: published.searcher,
            record: published.record,
            uid_field,
            ledger: Arc::clone(&self.ledger),
            released: false,
        };

        tracing::trace!(
            "Opened snapshot with {} docs at version {:?}",
            handle.num_docs(),
            version
        );

        Ok(ReaderSet {
            readers: vec![handle],
            version,
        })
    }

    /// Version recorded by the most recently opened snapshot
    pub fn current_version(&self) -> Option<VersionToken> {
        self.last_opened
            .read()
            .map(|last| last.as_ref().map(|r| r.version.clone()))
            .unwrap_or_else(|poisoned| poisoned.into_inner().as_ref().map(|r| r.version.clone()))
    }

    /// Release readers; failures are logged, never returned
    pub fn release_readers(&self, readers: Vec<ReaderHandle>) {
        for mut reader in readers {
            if reader.ledger.provider_id != self.ledger.provider_id {
                let err = IngestError::ReleaseFailed(format!(
                    "reader belongs to provider {}, not {}",
                    reader.ledger.provider_id, self.ledger.provider_id
                ));
                tracing::error!("{}", err);
            }
            reader.released = true;
        }
    }

    /// Open a snapshot, run `f`, and release the snapshot on every path
    pub fn with_snapshot<T>(&self, f: impl FnOnce(&ReaderSet) -> T) -> Result<T> {
        let set = self.open_readers()?;
        let out = f(&set);
        self.release_readers(set.readers);
        Ok(out)
    }

    /// Readers opened by this provider and not yet dropped
    pub fn open_reader_count(&self) -> usize {
        self.ledger.open.load(AtomicOrdering::Acquire)
    }

    /// Unsupported: ordering is decided where index sources are combined
    pub fn version(&self) -> Result<VersionToken> {
        Err(IngestError::Unsupported(
            "version is not tracked per writer".to_string(),
        ))
    }

    /// Unsupported: ordering is decided where index sources are combined
    pub fn version_comparator(&self) -> Result<VersionComparator> {
        Err(IngestError::Unsupported(
            "version ordering is not defined per writer".to_string(),
        ))
    }

    fn observe(&self, record: &CommitRecord) {
        let mut last = self
            .last_opened
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let newer = match last.as_ref() {
            Some(current) => record.sequence >= current.sequence,
            None => true,
        };
        if newer {
            *last = Some(record.clone());
        }
    }
}

impl IndexReaderFactory for SnapshotReaderProvider {
    type Reader = ReaderHandle;

    fn get_readers(&self) -> Result<Vec<ReaderHandle>> {
        Ok(self.open_readers()?.readers)
    }

    fn return_readers(&self, readers: Vec<ReaderHandle>) {
        self.release_readers(readers)
    }

    fn current_reader_version(&self) -> Option<VersionToken> {
        self.current_version()
    }

    fn version(&self) -> Result<VersionToken> {
        SnapshotReaderProvider::version(self)
    }

    fn version_comparator(&self) -> Result<VersionComparator> {
        SnapshotReaderProvider::version_comparator(self)
    }
}
