//! Storage layer over the tantivy index.
//!
//! This module owns the single mutable index instance and the
//! conventions documents are written with.
//!
//! # Architecture
//!
//! - **IndexWriterHandle**: lifecycle, retract/insert, versioned commits
//! - **schema**: the reserved uid field and schema helpers
//! - **analysis**: per-document analyzer overrides
//!
//! # Index Directory Structure
//!
//! ```text
//! {index_dir}/
//! ├── meta.json               # Segment list + commit payload (CommitRecord)
//! ├── .managed.json
//! ├── .tantivy-writer.lock    # Held while a writer handle is started
//! └── [segment files]
//! ```

mod analysis;
mod schema;
mod writer;

pub use schema::{add_uid_field, create_schema, uid_field_options, validate_uid_field, UID_FIELD};
pub use writer::{IndexWriterHandle, StorageLocation};
