//! Consumer pipeline: batches of events in, one versioned commit out.
//!
//! For every event the pipeline interprets the payload, retracts the
//! uid's prior documents and inserts the new ones, tagging each with the
//! uid. A batch ends in exactly one commit stamped with the last version
//! seen. If anything fails mid-batch, the writer is rolled back so none
//! of the batch's mutations can ride along with a later commit. The
//! rollback also drops mutations left pending by earlier unversioned
//! batches; their count is reported on the returned error.

use crate::core::error::{ConsumeError, IngestError};
use crate::core::indexable::{Analyzer, Indexable, Interpreter, MutationRequest};
use crate::core::storage::IndexWriterHandle;
use crate::core::types::{BatchOutcome, DataEvent, VersionToken, WriterState};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use tantivy::schema::Field;
use tantivy::TantivyDocument;

/// Ingestion-side contract
pub trait DataConsumer<D> {
    /// Apply one batch of events
    fn consume(&mut self, events: &[DataEvent<D>]) -> Result<(), ConsumeError>;
}

/// Sequential ingestion pipeline over a shared writer handle
///
/// Batches must not be consumed concurrently against the same writer;
/// `&mut self` keeps a single pipeline sequential, and callers running
/// several pipelines over one writer must serialize them.
pub struct ConsumerPipeline<D, I> {
    writer: Arc<IndexWriterHandle>,
    interpreter: I,
    default_analyzer: Analyzer,
    _payload: PhantomData<fn(&D)>,
}

impl<D, I> ConsumerPipeline<D, I>
where
    I: Interpreter<D>,
{
    pub fn new(writer: Arc<IndexWriterHandle>, interpreter: I) -> Self {
        Self {
            writer,
            interpreter,
            default_analyzer: Analyzer::default(),
            _payload: PhantomData,
        }
    }

    /// Analyzer for requests without an override
    pub fn with_default_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.default_analyzer = analyzer;
        self
    }

    pub fn default_analyzer(&self) -> &Analyzer {
        &self.default_analyzer
    }

    pub fn writer(&self) -> &Arc<IndexWriterHandle> {
        &self.writer
    }

    /// Apply one batch and report what it did
    pub fn consume_batch(&mut self, events: &[DataEvent<D>]) -> Result<BatchOutcome, ConsumeError> {
        let start = Instant::now();
        let batch_len = events.len();

        let state = self.writer.state();
        if state != WriterState::Started {
            return Err(ConsumeError::new(
                batch_len,
                None,
                IngestError::NotStarted(state),
            ));
        }

        if events.is_empty() {
            tracing::trace!("Empty batch; nothing to do");
            return Ok(BatchOutcome::default());
        }

        // Pending work from earlier unversioned batches shares this batch's fate
        let carried = self.writer.pending_mutations();

        let uid_field = self
            .writer
            .uid_field()
            .map_err(|e| ConsumeError::new(batch_len, None, e))?;

        let mut outcome = BatchOutcome {
            events: batch_len,
            ..BatchOutcome::default()
        };
        let mut version: Option<&VersionToken> = None;

        for (idx, event) in events.iter().enumerate() {
            let indexable = self.interpreter.interpret(&event.payload);
            if let Some(v) = &event.version {
                version = Some(v);
            }

            if indexable.is_skip() {
                tracing::trace!("Skipping event {} (uid {})", idx, indexable.uid());
                outcome.skipped += 1;
                continue;
            }

            if let Err(e) = self.apply(uid_field, indexable, &mut outcome) {
                return Err(self.abort(batch_len, Some(idx), carried, e));
            }
        }

        match version {
            Some(version) => match self.writer.commit(version) {
                Ok(record) => outcome.committed_version = Some(record.version),
                Err(e) => return Err(self.abort(batch_len, None, carried, e)),
            },
            None => {
                tracing::warn!(
                    "Batch of {} events carried no version; {} mutations left pending",
                    batch_len,
                    self.writer.pending_mutations()
                );
            }
        }

        outcome.duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "Batch consumed: {} events ({} skipped), {} retracted, {} inserted, \
             version {} in {}ms",
            outcome.events,
            outcome.skipped,
            outcome.retracted,
            outcome.inserted,
            outcome
                .committed_version
                .as_ref()
                .map(VersionToken::as_str)
                .unwrap_or("-"),
            outcome.duration_ms
        );

        Ok(outcome)
    }

    /// Retract the uid, then insert each request tagged with it
    fn apply(
        &self,
        uid_field: Field,
        indexable: Indexable,
        outcome: &mut BatchOutcome,
    ) -> Result<(), IngestError> {
        let uid = indexable.uid().to_string();

        self.writer.retract(&uid)?;
        outcome.retracted += 1;

        for MutationRequest { fields, analyzer } in indexable.into_requests() {
            let doc = tag_with_uid(fields, uid_field, &uid);
            let analyzer = analyzer.as_ref().unwrap_or(&self.default_analyzer);

            self.writer.insert_document(doc, analyzer)?;
            outcome.inserted += 1;
        }

        tracing::debug!("Applied uid {}", uid);
        Ok(())
    }

    fn abort(
        &self,
        batch_len: usize,
        event_index: Option<usize>,
        carried: usize,
        source: IngestError,
    ) -> ConsumeError {
        tracing::error!(
            "Batch of {} events aborted{}: {}",
            batch_len,
            event_index
                .map(|idx| format!(" at event {idx}"))
                .unwrap_or_default(),
            source
        );

        if let Err(e) = self.writer.rollback() {
            tracing::error!("Failed to roll back aborted batch: {}", e);
        }

        if carried > 0 {
            tracing::warn!(
                "Rollback discarded {} pending mutations from earlier unversioned batches",
                carried
            );
        }

        ConsumeError::new(batch_len, event_index, source).with_discarded_pending(carried)
    }
}

impl<D, I> DataConsumer<D> for ConsumerPipeline<D, I>
where
    I: Interpreter<D>,
{
    fn consume(&mut self, events: &[DataEvent<D>]) -> Result<(), ConsumeError> {
        self.consume_batch(events).map(|_| ())
    }
}

/// Inject the uid, dropping any caller-supplied value for the field
fn tag_with_uid(fields: TantivyDocument, uid_field: Field, uid: &str) -> TantivyDocument {
    let mut doc = if fields.get_first(uid_field).is_some() {
        tracing::warn!("Dropping caller-supplied identity field for uid {}", uid);
        let mut stripped = TantivyDocument::default();
        for field_value in fields.field_values() {
            if field_value.field() != uid_field {
                stripped.add_field_value(field_value.field(), field_value.value().clone());
            }
        }
        stripped
    } else {
        fields
    };

    doc.add_text(uid_field, uid);
    doc
}
