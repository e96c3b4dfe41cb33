//! Schema support for the reserved identity field.
//!
//! Every document written by the pipeline carries its uid in the
//! reserved `id` field: a raw, untokenized string indexed without
//! positions or field norms so it never influences scoring.

use crate::core::error::{IngestError, Result};
use tantivy::schema::*;

/// Reserved field carrying each document's uid
pub const UID_FIELD: &str = "id";

/// Tokenizer used for the uid field
const UID_TOKENIZER: &str = "raw";

/// Field options for the uid field
///
/// raw | Basic record | no field norms | STORED
pub fn uid_field_options() -> TextOptions {
    let indexing = TextFieldIndexing::default()
        .set_tokenizer(UID_TOKENIZER)
        .set_index_option(IndexRecordOption::Basic)
        .set_fieldnorms(false);

    TextOptions::default()
        .set_indexing_options(indexing)
        .set_stored()
}

/// Add the reserved uid field to a schema under construction
pub fn add_uid_field(builder: &mut SchemaBuilder) -> Field {
    builder.add_text_field(UID_FIELD, uid_field_options())
}

/// Create a schema with the uid field plus the given text fields
///
/// Text fields are `TEXT | STORED` and use the default tokenizer.
pub fn create_schema(text_fields: &[String]) -> Result<Schema> {
    let mut builder = Schema::builder();
    add_uid_field(&mut builder);

    for name in text_fields {
        if name == UID_FIELD {
            return Err(IngestError::InvalidSchema(format!(
                "'{UID_FIELD}' is reserved for document identity"
            )));
        }
        builder.add_text_field(name, TEXT | STORED);
    }

    Ok(builder.build())
}

/// Resolve and check the uid field of a schema
///
/// The field must exist, be a raw-tokenized indexed string field and
/// be stored.
pub fn validate_uid_field(schema: &Schema) -> Result<Field> {
    let field = schema
        .get_field(UID_FIELD)
        .map_err(|e| IngestError::InvalidSchema(format!("Missing {UID_FIELD} field: {e}")))?;

    let entry = schema.get_field_entry(field);
    let indexing = match entry.field_type() {
        FieldType::Str(options) => options.get_indexing_options(),
        other => {
            return Err(IngestError::InvalidSchema(format!(
                "{UID_FIELD} field must be a text field, found {:?}",
                other.value_type()
            )))
        }
    };

    let indexing = indexing.ok_or_else(|| {
        IngestError::InvalidSchema(format!("{UID_FIELD} field must be indexed"))
    })?;

    if indexing.tokenizer() != UID_TOKENIZER {
        return Err(IngestError::InvalidSchema(format!(
            "{UID_FIELD} field must use the '{UID_TOKENIZER}' tokenizer, found '{}'",
            indexing.tokenizer()
        )));
    }

    if !entry.is_stored() {
        return Err(IngestError::InvalidSchema(format!(
            "{UID_FIELD} field must be stored"
        )));
    }

    Ok(field)
}

/// Tokenizer configured for an indexed text field, if any
pub(crate) fn field_tokenizer(schema: &Schema, field: Field) -> Option<&str> {
    match schema.get_field_entry(field).field_type() {
        FieldType::Str(options) => options.get_indexing_options().map(|idx| idx.tokenizer()),
        _ => None,
    }
}
