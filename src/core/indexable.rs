//! Indexable view of a domain event.
//!
//! An [`Interpreter`] turns one payload into an [`Indexable`]: the uid
//! that identifies the payload in the index, a skip flag, and the
//! ordered mutation requests to apply once the uid has been retracted.

use std::fmt;
use tantivy::TantivyDocument;

/// Name of tantivy's built-in default tokenizer
pub const DEFAULT_ANALYZER: &str = "default";

/// Named text-processing strategy
///
/// Refers to a tokenizer registered with the index's tokenizer manager
/// (tantivy built-ins or analyzers registered on the writer handle
/// before start).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Analyzer(String);

impl Analyzer {
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self(DEFAULT_ANALYZER.to_string())
    }
}

impl fmt::Display for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One document to insert for an indexable
#[derive(Debug, Clone)]
pub struct MutationRequest {
    /// Searchable fields (must not carry the reserved uid field)
    pub fields: TantivyDocument,

    /// Analyzer overriding the pipeline default for this document
    pub analyzer: Option<Analyzer>,
}

impl MutationRequest {
    pub fn new(fields: TantivyDocument) -> Self {
        Self {
            fields,
            analyzer: None,
        }
    }

    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }
}

/// Interpreted form of a payload
#[derive(Debug, Clone)]
pub struct Indexable {
    uid: String,
    skip: bool,
    requests: Vec<MutationRequest>,
}

impl Indexable {
    /// Indexable whose prior state is replaced by `requests`
    ///
    /// An empty request list retracts the uid without re-inserting.
    pub fn new(uid: impl Into<String>, requests: Vec<MutationRequest>) -> Self {
        Self {
            uid: uid.into(),
            skip: false,
            requests,
        }
    }

    /// Indexable that leaves the index untouched
    pub fn skip(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            skip: true,
            requests: Vec::new(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn is_skip(&self) -> bool {
        self.skip
    }

    pub fn requests(&self) -> &[MutationRequest] {
        &self.requests
    }

    pub fn into_requests(self) -> Vec<MutationRequest> {
        self.requests
    }
}

/// Converts a payload into its indexable view
///
/// Implementations must be free of side effects. Any
/// `Fn(&D) -> Indexable` closure is an interpreter.
pub trait Interpreter<D>: Send + Sync {
    fn interpret(&self, payload: &D) -> Indexable;
}

impl<D, F> Interpreter<D> for F
where
    F: Fn(&D) -> Indexable + Send + Sync,
{
    fn interpret(&self, payload: &D) -> Indexable {
        self(payload)
    }
}
