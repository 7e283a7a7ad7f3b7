//! Document lookups that need a definite answer rather than an `Option`.

use std::sync::Arc;

use super::store::DocumentRegistry;
use crate::error::{NotFound, PipelineError};
use crate::models::{DocumentFilter, DocumentRecord};

#[derive(Clone)]
pub struct DocumentService {
    registry: Arc<dyn DocumentRegistry>,
}

impl DocumentService {
    pub fn new(registry: Arc<dyn DocumentRegistry>) -> Self {
        Self { registry }
    }

    pub async fn get(&self, document_id: &str) -> Result<DocumentRecord, PipelineError> {
        self.registry
            .get_by_id(document_id)
            .await?
            .ok_or_else(|| NotFound::Document(document_id.to_string()).into())
    }

    /// Public link to the stored file of a document.
    pub async fn public_url_for(&self, document_id: &str) -> Result<String, PipelineError> {
        let record = self.get(document_id).await?;
        let Some(path) = record.storage_path.as_deref().filter(|p| !p.is_empty()) else {
            tracing::warn!(document = %document_id, "document has no storage path");
            return Err(NotFound::PublicUrl(document_id.to_string()).into());
        };

        self.registry
            .public_url(path)
            .await?
            .ok_or_else(|| NotFound::PublicUrl(document_id.to_string()).into())
    }

    pub async fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>, PipelineError> {
        Ok(self.registry.list(filter).await?)
    }
}
