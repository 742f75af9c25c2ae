use serde_json::Value;

use crate::core::Document;
use crate::error::PersistenceDecodeError;
use crate::schema::ValidationMode;

/// Serializes a document to the stored JSON form:
/// `[{"type": "paragraph", "children": [{"text": "..", "bold": true}]}]`.
pub fn to_json(doc: &Document) -> Result<String, serde_json::Error> {
    serde_json::to_string(doc)
}

pub fn to_json_pretty(doc: &Document) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(doc)
}

/// Parses and validates a stored value.
pub fn from_json_str(s: &str, mode: ValidationMode) -> Result<Document, PersistenceDecodeError> {
    let value: Value = serde_json::from_str(s)?;
    Ok(Document::from_value(&value, mode)?)
}
