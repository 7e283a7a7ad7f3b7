//! Storage abstraction layer.
//!
//! Two read-only capabilities sit behind traits so the pipelines never depend
//! on a concrete database: the [`FragmentStore`] (similarity search and
//! by-document lookups) and the [`DocumentRegistry`] (canonical document
//! records and public links). [`PostgresBackend`] implements both over one pool.

mod postgres;

pub use postgres::{COMPLETED_STATUS, PostgresBackend};

use async_trait::async_trait;
use std::fmt;

use crate::error::{RegistryError, RetrievalError};
use crate::models::{DocumentFilter, DocumentRecord, Fragment};

/// One query shape for finding the fragments of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupStrategy {
    /// `table.metadata->>key = document_id`
    MetadataKey { table: String, key: String },
    /// Set-returning SQL function taking the document id
    Function { name: String },
    /// `table.column = document_id`
    Column { table: String, column: String },
}

impl fmt::Display for LookupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupStrategy::MetadataKey { table, key } => write!(f, "{table}.metadata->>{key}"),
            LookupStrategy::Function { name } => write!(f, "{name}(document_id)"),
            LookupStrategy::Column { table, column } => write!(f, "{table}.{column}"),
        }
    }
}

/// Queryable collection of document fragments.
#[async_trait]
pub trait FragmentStore: Send + Sync {
    /// Check if the store is reachable.
    async fn health_check(&self) -> Result<bool, RetrievalError>;

    /// Top `limit` fragments with similarity ≥ `threshold`, most similar first.
    async fn retrieve_similar(
        &self,
        query_vector: Vec<f32>,
        threshold: f32,
        limit: u32,
    ) -> Result<Vec<Fragment>, RetrievalError>;

    /// Fragments of one document using a single query shape.
    async fn fragments_by(
        &self,
        strategy: &LookupStrategy,
        document_id: &str,
    ) -> Result<Vec<Fragment>, RetrievalError>;
}

/// Registry of uploaded documents.
#[async_trait]
pub trait DocumentRegistry: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Option<DocumentRecord>, RegistryError>;

    async fn find_by_exact_name(&self, name: &str)
    -> Result<Option<DocumentRecord>, RegistryError>;

    /// Public link for an object in the documents bucket.
    async fn public_url(&self, storage_path: &str) -> Result<Option<String>, RegistryError>;

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>, RegistryError>;

    /// Documents whose ingestion finished and produced key dates.
    async fn with_key_dates(
        &self,
        owner: Option<&str>,
    ) -> Result<Vec<DocumentRecord>, RegistryError>;
}

/// Check that a configured table/function/key name is a plain SQL identifier,
/// optionally schema-qualified.
pub fn validate_identifier(name: &str) -> Result<&str, RetrievalError> {
    let valid = !name.is_empty()
        && name.split('.').count() <= 2
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if valid {
        Ok(name)
    } else {
        Err(RetrievalError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("document_chunks").is_ok());
        assert!(validate_identifier("public.document_chunks").is_ok());
        assert!(validate_identifier("_t1").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1chunks").is_err());
        assert!(validate_identifier("chunks; DROP TABLE documents").is_err());
        assert!(validate_identifier("a.b.c").is_err());
        assert!(validate_identifier("chunks\"").is_err());
    }

    #[test]
    fn test_strategy_display() {
        let s = LookupStrategy::MetadataKey {
            table: "document_chunks".to_string(),
            key: "documentId".to_string(),
        };
        assert_eq!(s.to_string(), "document_chunks.metadata->>documentId");
        let s = LookupStrategy::Function {
            name: "get_document_chunks".to_string(),
        };
        assert_eq!(s.to_string(), "get_document_chunks(document_id)");
    }
}
