//! JSON Lines event source.
//!
//! One event per line:
//!
//! ```json
//! {"uid": "7", "version": "v2", "docs": [{"fields": {"title": "hello"}, "analyzer": "en_stem"}]}
//! ```
//!
//! `version`, `skip`, `docs` and `analyzer` are optional. A directory
//! is walked recursively and every file whose name matches the event
//! pattern is read, in path order.

use crate::core::error::{IngestError, Result};
use crate::core::indexable::{Analyzer, Indexable, Interpreter, MutationRequest};
use crate::core::storage::validate_uid_field;
use crate::core::types::{DataEvent, VersionToken};
use glob::Pattern;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tantivy::schema::{Field, Schema};
use tantivy::TantivyDocument;
use walkdir::WalkDir;

/// One line of an event file
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JsonEvent {
    /// Accepts strings and numbers
    #[serde(deserialize_with = "uid_from_value")]
    pub uid: String,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub skip: bool,

    #[serde(default)]
    pub docs: Vec<JsonDoc>,
}

/// Field values of one document, plus an optional analyzer override
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct JsonDoc {
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,

    #[serde(default)]
    pub analyzer: Option<String>,
}

fn uid_from_value<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "uid must be a non-empty string or a number, got {other}"
        ))),
    }
}

impl JsonEvent {
    /// Wrap into a pipeline event, lifting out the version
    pub fn into_data_event(self) -> DataEvent<JsonEvent> {
        match self.version.clone() {
            Some(version) => DataEvent::new(self, VersionToken::new(version)),
            None => DataEvent::unversioned(self),
        }
    }
}

/// Maps JSON events onto the documents of a schema
#[derive(Debug, Clone)]
pub struct JsonInterpreter {
    schema: Schema,
    uid_field: Field,
}

impl JsonInterpreter {
    pub fn new(schema: Schema) -> Result<Self> {
        let uid_field = validate_uid_field(&schema)?;
        Ok(Self { schema, uid_field })
    }

    fn to_document(&self, uid: &str, doc: &JsonDoc) -> TantivyDocument {
        let mut out = TantivyDocument::default();

        for (name, value) in &doc.fields {
            let field = match self.schema.get_field(name) {
                Ok(field) if field != self.uid_field => field,
                Ok(_) => {
                    // injected by the pipeline
                    continue;
                }
                Err(_) => {
                    tracing::warn!("Event {}: ignoring unknown field '{}'", uid, name);
                    continue;
                }
            };

            match value {
                Value::Null => {}
                Value::Array(values) => {
                    for v in values {
                        if let Some(text) = as_text(v) {
                            out.add_text(field, text);
                        }
                    }
                }
                v => {
                    if let Some(text) = as_text(v) {
                        out.add_text(field, text);
                    }
                }
            }
        }

        out
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl Interpreter<JsonEvent> for JsonInterpreter {
    fn interpret(&self, event: &JsonEvent) -> Indexable {
        if event.skip {
            return Indexable::skip(event.uid.as_str());
        }

        let requests = event
            .docs
            .iter()
            .map(|doc| {
                let request = MutationRequest::new(self.to_document(&event.uid, doc));
                match &doc.analyzer {
                    Some(name) => request.with_analyzer(Analyzer::named(name.as_str())),
                    None => request,
                }
            })
            .collect();

        Indexable::new(event.uid.as_str(), requests)
    }
}

/// Parse JSON Lines text; blank lines are ignored
pub fn parse_events(source: &str, contents: &str) -> Result<Vec<DataEvent<JsonEvent>>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<JsonEvent>(line)
                .map(JsonEvent::into_data_event)
                .map_err(|e| IngestError::InvalidEvent(format!("{source}:{}: {e}", idx + 1)))
        })
        .collect()
}

/// Event files under `root` whose file name matches `pattern`, sorted
pub fn event_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(pattern).map_err(|e| {
        IngestError::ConfigError(format!("Invalid event pattern '{pattern}': {e}"))
    })?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    continue;
                }
                let matches = entry
                    .path()
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| pattern.matches(name));
                if matches {
                    files.push(entry.into_path());
                }
            }
            Err(e) => tracing::warn!("Walk error: {}", e),
        }
    }

    Ok(files)
}

/// Read events from a file, or from every matching file of a directory
pub fn read_events(path: &Path, pattern: &str) -> Result<Vec<DataEvent<JsonEvent>>> {
    let files = if path.is_dir() {
        event_files(path, pattern)?
    } else if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        return Err(IngestError::InvalidEvent(format!(
            "Event source not found: {}",
            path.display()
        )));
    };

    let mut events = Vec::new();
    for file in &files {
        let contents = fs::read_to_string(file)?;
        let parsed = parse_events(&file.display().to_string(), &contents)?;
        tracing::debug!("Read {} events from {:?}", parsed.len(), file);
        events.extend(parsed);
    }

    tracing::info!("Read {} events from {} file(s)", events.len(), files.len());
    Ok(events)
}
