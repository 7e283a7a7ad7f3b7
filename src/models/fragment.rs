//! Fragment model: one retrievable unit of document text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Columns that never reach the metadata extractors.
const SKIPPED_COLUMNS: &[&str] = &["embedding"];

/// A stored unit of document text plus its loosely-typed metadata.
///
/// Fragments are produced by an external ingestion pipeline and are read-only
/// here. Their metadata has no fixed schema, so every column the store returned
/// besides `id`, `content` and `metadata` is kept in `fields` for the extractors
/// in [`crate::rag::metadata`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Opaque identifier, not stable across storage backends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Text passed to the generative model.
    #[serde(default)]
    pub content: String,

    /// Semi-structured metadata bag.
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Remaining top-level columns of the stored row.
    #[serde(default, flatten)]
    pub fields: Map<String, Value>,
}

impl Fragment {
    /// Create a fragment with content and metadata.
    pub fn new(content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            id: None,
            content: content.into(),
            metadata,
            fields: Map::new(),
        }
    }

    /// Set the fragment identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a top-level field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Build a fragment from a JSON row as returned by the store.
    ///
    /// `metadata` may arrive as an object, as a JSON-encoded string, or be absent.
    /// Malformed metadata degrades to an empty bag and is logged; it never fails
    /// the row.
    pub fn from_row(row: Value) -> Option<Self> {
        let Value::Object(mut columns) = row else {
            return None;
        };

        let id = columns.remove("id").and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        let content = match columns.remove("content") {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let metadata = match columns.remove("metadata") {
            Some(Value::Object(map)) => map,
            Some(Value::String(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                _ => {
                    tracing::warn!(fragment = ?id, "fragment metadata is not a JSON object, ignoring it");
                    Map::new()
                }
            },
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                tracing::warn!(fragment = ?id, kind = %json_kind(&other), "unexpected metadata type, ignoring it");
                Map::new()
            }
        };

        for column in SKIPPED_COLUMNS {
            columns.remove(*column);
        }

        Some(Self {
            id,
            content,
            metadata,
            fields: columns,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_row_splits_columns() {
        let row = json!({
            "id": 42,
            "content": "Plazo de entrega: 15 de marzo",
            "metadata": {"documentId": "doc-1", "page": 2},
            "similarity": 0.83,
            "embedding": [0.1, 0.2]
        });

        let fragment = Fragment::from_row(row).unwrap();
        assert_eq!(fragment.id.as_deref(), Some("42"));
        assert_eq!(fragment.content, "Plazo de entrega: 15 de marzo");
        assert_eq!(fragment.metadata["documentId"], "doc-1");
        assert_eq!(fragment.fields["similarity"], 0.83);
        assert!(!fragment.fields.contains_key("embedding"));
    }

    #[test]
    fn test_from_row_parses_string_metadata() {
        let row = json!({
            "id": "a",
            "content": "x",
            "metadata": "{\"document_id\": \"doc-2\"}"
        });
        let fragment = Fragment::from_row(row).unwrap();
        assert_eq!(fragment.metadata["document_id"], "doc-2");
    }

    #[test]
    fn test_from_row_tolerates_malformed_metadata() {
        let row = json!({"content": "x", "metadata": "{not json"});
        let fragment = Fragment::from_row(row).unwrap();
        assert!(fragment.metadata.is_empty());
        assert!(fragment.id.is_none());

        let row = json!({"content": null, "metadata": [1, 2]});
        let fragment = Fragment::from_row(row).unwrap();
        assert!(fragment.metadata.is_empty());
        assert!(fragment.content.is_empty());
    }

    #[test]
    fn test_from_row_rejects_non_objects() {
        assert!(Fragment::from_row(json!([1, 2, 3])).is_none());
    }
}
