//! Per-document analyzer overrides.
//!
//! Tantivy binds tokenizers to fields in the schema. A document that
//! asks for a different analyzer has its string values tokenized up
//! front and stored as pre-tokenized text, which the indexer consumes
//! as-is. Untokenized (`raw`) fields are left alone, as are fields that
//! already use the requested analyzer.

use crate::core::error::{IngestError, Result};
use crate::core::indexable::Analyzer;
use crate::core::storage::schema::field_tokenizer;
use tantivy::schema::{OwnedValue, Schema};
use tantivy::tokenizer::{PreTokenizedString, Token, TokenStream, TokenizerManager};
use tantivy::TantivyDocument;

const RAW_TOKENIZER: &str = "raw";

/// Rewrite `doc` so its analyzed text fields go through `analyzer`
pub(crate) fn apply_analyzer(
    doc: TantivyDocument,
    schema: &Schema,
    tokenizers: &TokenizerManager,
    analyzer: &Analyzer,
) -> Result<TantivyDocument> {
    if !needs_rewrite(&doc, schema, analyzer) {
        return Ok(doc);
    }

    let mut text_analyzer = tokenizers.get(analyzer.name()).ok_or_else(|| {
        IngestError::MutationFailed(format!("Unknown analyzer: {}", analyzer.name()))
    })?;

    let mut rewritten = TantivyDocument::default();
    for field_value in doc.field_values() {
        let field = field_value.field();
        match field_value.value() {
            OwnedValue::Str(text) if overridable(schema, field, analyzer) => {
                let mut tokens = Vec::new();
                let mut stream = text_analyzer.token_stream(text);
                stream.process(&mut |token: &Token| tokens.push(token.clone()));

                rewritten.add_pre_tokenized_text(
                    field,
                    PreTokenizedString {
                        text: text.clone(),
                        tokens,
                    },
                );
            }
            value => rewritten.add_field_value(field, value.clone()),
        }
    }

    Ok(rewritten)
}

fn needs_rewrite(doc: &TantivyDocument, schema: &Schema, analyzer: &Analyzer) -> bool {
    doc.field_values().iter().any(|fv| {
        matches!(fv.value(), OwnedValue::Str(_)) && overridable(schema, fv.field(), analyzer)
    })
}

fn overridable(schema: &Schema, field: tantivy::schema::Field, analyzer: &Analyzer) -> bool {
    match field_tokenizer(schema, field) {
        Some(RAW_TOKENIZER) | None => false,
        Some(tokenizer) => tokenizer != analyzer.name(),
    }
}
