//! Builds the pipelines from configuration.

use std::sync::Arc;

use crate::error::{AppError, PipelineError};
use crate::models::Config;
use crate::rag::{
    FragmentLookup, KeyDatesService, LookupChain, QueryPipeline, SourceResolver, SummaryPipeline,
};
use crate::services::{
    DocumentRegistry, DocumentService, FragmentStore, GeminiEmbedder, GeminiGenerator,
    PostgresBackend,
};

/// Connected application: one database pool shared by every service.
pub struct App {
    config: Config,
    backend: Arc<PostgresBackend>,
}

impl App {
    pub async fn connect(config: Config) -> Result<Self, AppError> {
        let backend = PostgresBackend::connect(&config.database, &config.storage).await?;
        Ok(Self {
            config,
            backend: Arc::new(backend),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn FragmentStore> {
        self.backend.clone()
    }

    pub fn registry(&self) -> Arc<dyn DocumentRegistry> {
        self.backend.clone()
    }

    pub fn fragment_lookup(&self) -> FragmentLookup {
        FragmentLookup::new(self.store(), LookupChain::from_config(&self.config.database))
            .with_concurrency(self.config.database.pool_max as usize)
    }

    pub fn query_pipeline(&self) -> Result<QueryPipeline, AppError> {
        let embedder = GeminiEmbedder::new(&self.config.gemini).map_err(PipelineError::from)?;
        let generator =
            GeminiGenerator::for_answers(&self.config.gemini).map_err(PipelineError::from)?;

        Ok(QueryPipeline::new(
            Arc::new(embedder),
            self.store(),
            Arc::new(generator),
            SourceResolver::new(self.registry()),
            &self.config.rag,
        ))
    }

    pub fn summary_pipeline(&self) -> Result<SummaryPipeline, AppError> {
        let generator =
            GeminiGenerator::for_summaries(&self.config.gemini).map_err(PipelineError::from)?;

        Ok(SummaryPipeline::new(
            self.registry(),
            self.fragment_lookup(),
            Arc::new(generator),
            &self.config.summary,
        ))
    }

    pub fn documents(&self) -> DocumentService {
        DocumentService::new(self.registry())
    }

    pub fn key_dates(&self) -> KeyDatesService {
        KeyDatesService::new(self.registry())
    }
}
