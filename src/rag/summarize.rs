//! Summarization pipeline: reassemble a whole document and summarize it.

use std::sync::Arc;

use super::context;
use super::lookup::FragmentLookup;
use crate::error::{NotFound, PipelineError};
use crate::models::{DocumentRecord, Summary, SummaryConfig};
use crate::services::{DocumentRegistry, Generator};

pub struct SummaryPipeline {
    registry: Arc<dyn DocumentRegistry>,
    lookup: FragmentLookup,
    generator: Arc<dyn Generator>,
    max_chars: usize,
}

impl SummaryPipeline {
    pub fn new(
        registry: Arc<dyn DocumentRegistry>,
        lookup: FragmentLookup,
        generator: Arc<dyn Generator>,
        config: &SummaryConfig,
    ) -> Self {
        Self {
            registry,
            lookup,
            generator,
            max_chars: config.max_chars,
        }
    }

    /// Summarize one document in five key points.
    ///
    /// When `caller` is given (and not blank) it must own the document.
    pub async fn summarize(
        &self,
        document_id: &str,
        caller: Option<&str>,
    ) -> Result<Summary, PipelineError> {
        let record = self.authorize(document_id, caller).await?;

        let outcome = self.lookup.find(&record.id).await?;
        tracing::info!(
            document = %record.id,
            strategy = %outcome.strategy,
            count = outcome.fragments.len(),
            "collected fragments"
        );

        let mut fragments = outcome.fragments;
        context::order_fragments(&mut fragments);

        let document = context::assemble_document(&fragments, self.max_chars);
        if document.truncated {
            tracing::info!(document = %record.id, max_chars = self.max_chars, "document text truncated");
        }

        let summary = self
            .generator
            .generate(&context::summary_prompt(&document))
            .await?;

        Ok(Summary {
            document_id: record.id,
            summary,
            truncated: document.truncated,
            fragment_count: fragments.len(),
        })
    }

    /// Fetch the document and check that `caller` may read it.
    pub async fn authorize(
        &self,
        document_id: &str,
        caller: Option<&str>,
    ) -> Result<DocumentRecord, PipelineError> {
        let record = self
            .registry
            .get_by_id(document_id)
            .await?
            .ok_or_else(|| NotFound::Document(document_id.to_string()))?;

        let caller = caller.map(str::trim).filter(|user| !user.is_empty());
        if let Some(user) = caller.filter(|user| !record.is_owned_by(user)) {
            tracing::warn!(document = %document_id, user = %user, "summary requested by non-owner");
            return Err(PipelineError::Forbidden {
                document_id: document_id.to_string(),
            });
        }

        Ok(record)
    }
}
