// Test fixtures: a small payload type and JSON Lines event files

use nrt_ingest::core::storage::create_schema;
use nrt_ingest::{DataEvent, Indexable, Interpreter, MutationRequest};
use std::fs;
use std::path::{Path, PathBuf};
use tantivy::schema::{Field, Schema};
use tantivy::TantivyDocument;
use tempfile::TempDir;

/// Payload used by the pipeline tests
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Note {
    pub uid: String,
    pub bodies: Vec<String>,
    pub skip: bool,
}

/// Versioned note event with a single body
#[allow(dead_code)]
pub fn note(uid: &str, body: &str, version: &str) -> DataEvent<Note> {
    DataEvent::new(
        Note {
            uid: uid.to_string(),
            bodies: vec![body.to_string()],
            skip: false,
        },
        version,
    )
}

/// One document per body, all on the `body` field
#[allow(dead_code)]
pub struct NoteInterpreter {
    body: Field,
}

impl NoteInterpreter {
    #[allow(dead_code)]
    pub fn new(schema: &Schema) -> Self {
        Self {
            body: schema.get_field("body").expect("schema has body"),
        }
    }

    #[allow(dead_code)]
    pub fn schema() -> Schema {
        create_schema(&["body".to_string()]).expect("valid schema")
    }
}

impl Interpreter<Note> for NoteInterpreter {
    fn interpret(&self, note: &Note) -> Indexable {
        if note.skip {
            return Indexable::skip(note.uid.as_str());
        }
        let requests = note
            .bodies
            .iter()
            .map(|body| {
                let mut doc = TantivyDocument::default();
                doc.add_text(self.body, body);
                MutationRequest::new(doc)
            })
            .collect();
        Indexable::new(note.uid.as_str(), requests)
    }
}

/// JSON Lines event files in a temporary directory
#[allow(dead_code)]
pub struct EventLog {
    dir: TempDir,
}

impl EventLog {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Write `lines` to `name` (relative, parents created)
    #[allow(dead_code)]
    pub fn write(&self, name: &str, lines: &[&str]) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, lines.join("\n")).expect("Failed to write events");
        path
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
