//! Writer handle owning the single mutable tantivy index.
//!
//! The handle moves through `Unstarted -> Started -> Shutdown`. While
//! started it owns the tantivy `IndexWriter` (and with it the index
//! lock), applies retractions and insertions, and turns each commit into
//! a published snapshot: a reloaded `Searcher` paired with the
//! [`CommitRecord`] it was committed with.
//!
//! Mutations and commits serialize on the lifecycle mutex. Snapshot
//! readers only touch the published slot, which is swapped under a
//! short write lock after each commit completes, so an in-flight batch
//! is never visible and never blocks a reader.

use crate::core::config::WriterConfig;
use crate::core::error::{IngestError, Result};
use crate::core::indexable::Analyzer;
use crate::core::storage::analysis::apply_analyzer;
use crate::core::storage::schema::validate_uid_field;
use crate::core::types::{VersionToken, WriterState};
use crate::core::version::{CommitRecord, VersionTracker};
use std::path::PathBuf;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock};
use tantivy::directory::MmapDirectory;
use tantivy::schema::{Field, Schema, Term};
use tantivy::tokenizer::TextAnalyzer;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument};

/// Where the index lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// On-disk index directory (created if missing)
    Directory(PathBuf),

    /// Ephemeral in-memory index
    InMemory,
}

/// Committed state handed to snapshot readers
#[derive(Clone)]
pub(crate) struct PublishedSnapshot {
    pub searcher: Searcher,
    pub record: Option<CommitRecord>,
}

/// Engine state owned while started
struct ActiveIndex {
    index: Index,
    writer: IndexWriter,
    reader: IndexReader,
    uid_field: Field,
    pending: usize,
}

enum Lifecycle {
    Unstarted,
    Started(Box<ActiveIndex>),
    Shutdown,
}

impl Lifecycle {
    fn state(&self) -> WriterState {
        match self {
            Lifecycle::Unstarted => WriterState::Unstarted,
            Lifecycle::Started(_) => WriterState::Started,
            Lifecycle::Shutdown => WriterState::Shutdown,
        }
    }
}

/// Handle over the single mutable index instance
pub struct IndexWriterHandle {
    location: StorageLocation,
    schema: Schema,
    config: WriterConfig,
    analyzers: Mutex<Vec<(String, TextAnalyzer)>>,
    lifecycle: Mutex<Lifecycle>,
    published: RwLock<Option<PublishedSnapshot>>,
    tracker: VersionTracker,
    #[cfg(test)]
    fail_next_commit: AtomicBool,
}

impl std::fmt::Debug for IndexWriterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexWriterHandle")
            .field("location", &self.location)
            .field("state", &self.state())
            .field("schema", &"<schema>")
            .finish()
    }
}

impl IndexWriterHandle {
    /// Create an unstarted handle
    pub fn new(location: StorageLocation, schema: Schema, config: WriterConfig) -> Self {
        Self {
            location,
            schema,
            config,
            analyzers: Mutex::new(Vec::new()),
            lifecycle: Mutex::new(Lifecycle::Unstarted),
            published: RwLock::new(None),
            tracker: VersionTracker::new(),
            #[cfg(test)]
            fail_next_commit: AtomicBool::new(false),
        }
    }

    /// Register a named analyzer usable as a per-document override
    ///
    /// Analyzers registered before `start()` are installed when the index
    /// opens; on a started handle they are installed immediately.
    pub fn register_analyzer(&self, name: impl Into<String>, analyzer: TextAnalyzer) {
        let name = name.into();

        if let Lifecycle::Started(active) = &*self.lock_lifecycle() {
            active.index.tokenizers().register(&name, analyzer.clone());
        }

        self.analyzers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((name, analyzer));
    }

    /// Current lifecycle state
    pub fn state(&self) -> WriterState {
        self.lock_lifecycle().state()
    }

    /// Check whether mutations are accepted
    pub fn is_started(&self) -> bool {
        self.state() == WriterState::Started
    }

    /// Schema documents are written with
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Resolve the reserved uid field of the schema
    pub fn uid_field(&self) -> Result<Field> {
        validate_uid_field(&self.schema)
    }

    /// Version tracker fed by this handle's commits
    pub fn tracker(&self) -> &VersionTracker {
        &self.tracker
    }

    /// Best-effort start
    ///
    /// Failures are logged and leave the handle unusable; check
    /// [`is_started`](Self::is_started) before use.
    pub fn start(&self) {
        if let Err(e) = self.try_start() {
            tracing::error!("Unable to start index writer at {:?}: {}", self.location, e);
        }
    }

    /// Start and report failures to the caller
    pub fn try_start(&self) -> Result<()> {
        let mut lifecycle = self.lock_lifecycle();

        match &*lifecycle {
            Lifecycle::Started(_) => {
                tracing::warn!("Index writer already started");
                return Ok(());
            }
            Lifecycle::Shutdown => {
                return Err(IngestError::StartupFailed(
                    "Writer has been shut down".to_string(),
                ));
            }
            Lifecycle::Unstarted => {}
        }

        let uid_field = validate_uid_field(&self.schema)?;
        let index = self.open_index()?;

        for (name, analyzer) in self
            .analyzers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
        {
            index.tokenizers().register(name, analyzer.clone());
        }

        let acquired: tantivy::Result<IndexWriter> = if self.config.num_threads == 0 {
            index.writer(self.config.heap_size_bytes)
        } else {
            index.writer_with_num_threads(self.config.num_threads, self.config.heap_size_bytes)
        };
        let writer = acquired
            .map_err(|e| IngestError::StartupFailed(format!("Failed to acquire writer: {e}")))?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| IngestError::StartupFailed(format!("Failed to create reader: {e}")))?;

        let metas = index
            .load_metas()
            .map_err(|e| IngestError::StartupFailed(format!("Failed to load index meta: {e}")))?;
        let record = self.tracker.load(metas.payload.as_deref())?;

        self.publish(PublishedSnapshot {
            searcher: reader.searcher(),
            record: record.clone(),
        })?;

        *lifecycle = Lifecycle::Started(Box::new(ActiveIndex {
            index,
            writer,
            reader,
            uid_field,
            pending: 0,
        }));

        tracing::info!(
            "Index writer started at {:?} (last committed version: {})",
            self.location,
            record
                .as_ref()
                .map(|r| r.version.to_string())
                .unwrap_or_else(|| "none".to_string())
        );

        Ok(())
    }

    /// Remove every document carrying `uid`
    ///
    /// A no-op when no such document exists. Becomes visible with the
    /// next commit.
    pub fn retract(&self, uid: &str) -> Result<()> {
        self.with_active(|active| {
            let term = Term::from_field_text(active.uid_field, uid);
            active.writer.delete_term(term);
            active.pending += 1;
            tracing::trace!("Retracted uid {}", uid);
            Ok(())
        })
    }

    /// Add one document, analyzing its text with `analyzer`
    ///
    /// The document must already carry its uid.
    pub fn insert_document(&self, doc: TantivyDocument, analyzer: &Analyzer) -> Result<()> {
        self.with_active(|active| {
            let doc = apply_analyzer(doc, &self.schema, active.index.tokenizers(), analyzer)?;

            active
                .writer
                .add_document(doc)
                .map_err(|e| IngestError::MutationFailed(format!("Failed to add document: {e}")))?;
            active.pending += 1;
            Ok(())
        })
    }

    /// Durably commit every mutation since the last commit with `version`
    ///
    /// On success the committed state is published to snapshot readers
    /// before this returns.
    pub fn commit(&self, version: &VersionToken) -> Result<CommitRecord> {
        self.with_active(|active| {
            self.check_commit_fault()?;
            let record = Self::commit_active(active, version, &self.tracker)?;
            self.refresh_published(active, Some(record.clone()))?;
            Ok(record)
        })
    }

    /// Discard every mutation since the last commit
    pub fn rollback(&self) -> Result<()> {
        self.with_active(|active| {
            let discarded = active.pending;
            active
                .writer
                .rollback()
                .map_err(|e| IngestError::MutationFailed(format!("Failed to roll back: {e}")))?;
            active.pending = 0;
            tracing::debug!("Rolled back {} uncommitted mutations", discarded);
            Ok(())
        })
    }

    /// Mutations issued since the last commit
    pub fn pending_mutations(&self) -> usize {
        match &*self.lock_lifecycle() {
            Lifecycle::Started(active) => active.pending,
            _ => 0,
        }
    }

    /// Release the index; idempotent and never fails
    ///
    /// Pending mutations are flushed under the last committed version
    /// (the version does not advance). Failures are logged.
    pub fn shutdown(&self) {
        let mut lifecycle = self.lock_lifecycle();
        let previous = std::mem::replace(&mut *lifecycle, Lifecycle::Shutdown);

        match previous {
            Lifecycle::Started(mut active) => {
                if active.pending > 0 {
                    self.flush_on_shutdown(&mut active);
                }

                let ActiveIndex { writer, .. } = *active;
                if let Err(e) = writer.wait_merging_threads() {
                    tracing::error!("Failed to release index writer: {}", e);
                }
                tracing::info!("Index writer at {:?} shut down", self.location);
            }
            Lifecycle::Unstarted => {
                tracing::debug!("Shutting down a writer that was never started");
            }
            Lifecycle::Shutdown => {
                tracing::debug!("Index writer already shut down");
            }
        }

        match self.published.write() {
            Ok(mut slot) => *slot = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    /// Committed state for snapshot readers (`None` unless started)
    pub(crate) fn published_snapshot(&self) -> Result<Option<PublishedSnapshot>> {
        self.published
            .read()
            .map(|slot| slot.clone())
            .map_err(|e| IngestError::ReaderOpenFailed(format!("Snapshot slot poisoned: {e}")))
    }

    /// Make the next `commit` fail with `CommitFailed` before touching tantivy
    #[cfg(test)]
    pub(crate) fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn check_commit_fault(&self) -> Result<()> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(IngestError::CommitFailed("Injected commit failure".to_string()));
        }
        Ok(())
    }

    #[cfg(not(test))]
    #[inline]
    fn check_commit_fault(&self) -> Result<()> {
        Ok(())
    }

    fn commit_active(
        active: &mut ActiveIndex,
        version: &VersionToken,
        tracker: &VersionTracker,
    ) -> Result<CommitRecord> {
        let pending = active.pending;

        let mut prepared = active
            .writer
            .prepare_commit()
            .map_err(|e| IngestError::CommitFailed(format!("Failed to prepare commit: {e}")))?;

        let record = CommitRecord::new(version.clone(), prepared.opstamp());
        prepared.set_payload(&record.to_payload()?);

        prepared
            .commit()
            .map_err(|e| IngestError::CommitFailed(format!("Failed to commit: {e}")))?;

        active.pending = 0;
        tracker.record(record.clone())?;

        tracing::debug!(
            "Committed {} mutations at version {} (opstamp {})",
            pending,
            record.version,
            record.sequence
        );

        Ok(record)
    }

    fn refresh_published(&self, active: &ActiveIndex, record: Option<CommitRecord>) -> Result<()> {
        active.reader.reload().map_err(|e| {
            IngestError::CommitFailed(format!("Committed but failed to reload reader: {e}"))
        })?;

        self.publish(PublishedSnapshot {
            searcher: active.reader.searcher(),
            record,
        })
    }

    fn flush_on_shutdown(&self, active: &mut ActiveIndex) {
        let pending = active.pending;

        let result = match self.tracker.last_committed() {
            Some(last) => Self::commit_active(active, &last.version, &self.tracker).map(|_| ()),
            None => active
                .writer
                .commit()
                .map(|_| ())
                .map_err(|e| IngestError::CommitFailed(format!("Failed to commit: {e}"))),
        };

        match result {
            Ok(()) => tracing::info!("Flushed {} pending mutations on shutdown", pending),
            Err(e) => tracing::error!(
                "Failed to flush {} pending mutations on shutdown: {}",
                pending,
                e
            ),
        }
    }

    fn publish(&self, snapshot: PublishedSnapshot) -> Result<()> {
        let mut slot = self
            .published
            .write()
            .map_err(|e| IngestError::CommitFailed(format!("Snapshot slot poisoned: {e}")))?;
        *slot = Some(snapshot);
        Ok(())
    }

    fn open_index(&self) -> Result<Index> {
        match &self.location {
            StorageLocation::Directory(path) => {
                std::fs::create_dir_all(path).map_err(|e| {
                    IngestError::StartupFailed(format!("Failed to create {path:?}: {e}"))
                })?;

                let directory = MmapDirectory::open(path).map_err(|e| {
                    IngestError::StartupFailed(format!("Failed to open {path:?}: {e}"))
                })?;

                Index::open_or_create(directory, self.schema.clone())
                    .map_err(|e| IngestError::StartupFailed(format!("Failed to open index: {e}")))
            }
            StorageLocation::InMemory => Ok(Index::create_in_ram(self.schema.clone())),
        }
    }

    fn with_active<T>(&self, f: impl FnOnce(&mut ActiveIndex) -> Result<T>) -> Result<T> {
        let mut lifecycle = self.lock_lifecycle();
        match &mut *lifecycle {
            Lifecycle::Started(active) => f(active),
            other => Err(IngestError::NotStarted(other.state())),
        }
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        // Every transition is a single assignment, so a poisoned guard
        // still holds a consistent state.
        self.lifecycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for IndexWriterHandle {
    fn drop(&mut self) {
        if self.is_started() {
            self.shutdown();
        }
    }
}
