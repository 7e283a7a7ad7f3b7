//! Query pipeline: embed, retrieve, generate a grounded answer, cite sources.

use std::sync::Arc;
use std::time::Instant;

use super::context;
use super::resolver::SourceResolver;
use crate::error::PipelineError;
use crate::models::{Answer, RagConfig};
use crate::services::{Embedder, FragmentStore, Generator};

pub struct QueryPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn FragmentStore>,
    generator: Arc<dyn Generator>,
    resolver: SourceResolver,
    threshold: f32,
    limit: u32,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn FragmentStore>,
        generator: Arc<dyn Generator>,
        resolver: SourceResolver,
        config: &RagConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            generator,
            resolver,
            threshold: config.match_threshold,
            limit: config.match_count,
        }
    }

    /// Override the similarity threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Override the result cap.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Answer `query` from the closest fragments and cite where they came from.
    ///
    /// No matching fragments is not an error: the model is still asked, with
    /// an empty context, and the answer carries no sources.
    pub async fn answer(&self, query: &str) -> Result<Answer, PipelineError> {
        let start = Instant::now();
        let query = query.trim();
        if query.is_empty() {
            return Err(PipelineError::InvalidQuery(
                "query must not be empty".to_string(),
            ));
        }

        let vector = self.embedder.embed(query).await?;
        let fragments = self
            .store
            .retrieve_similar(vector, self.threshold, self.limit)
            .await?;
        tracing::info!(
            count = fragments.len(),
            threshold = self.threshold,
            limit = self.limit,
            "retrieved fragments"
        );

        let prompt = context::answer_prompt(&context::query_context(&fragments), query);

        let (generated, sources) = tokio::join!(
            self.generator.generate(&prompt),
            self.resolver.resolve(&fragments)
        );
        let answer = generated?;

        Ok(Answer {
            query: query.to_string(),
            answer,
            sources,
            fragments_used: fragments.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EmbeddingError, GenerationError, RetrievalError};
    use crate::models::DocumentRecord;
    use crate::rag::testing::{
        MemoryRegistry, MemoryStore, RecordingGenerator, StaticEmbedder, doc_fragment, fragment,
    };
    use serde_json::json;

    fn pipeline(
        embedder: StaticEmbedder,
        store: Arc<MemoryStore>,
        generator: Arc<RecordingGenerator>,
        registry: MemoryRegistry,
    ) -> QueryPipeline {
        QueryPipeline::new(
            Arc::new(embedder),
            store,
            generator,
            SourceResolver::new(Arc::new(registry)),
            &RagConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_no_matches_still_generates() {
        let store = Arc::new(MemoryStore::default());
        let generator = Arc::new(RecordingGenerator::replying("No information available."));
        let pipeline = pipeline(
            StaticEmbedder::default(),
            store.clone(),
            generator.clone(),
            MemoryRegistry::default(),
        );

        let answer = pipeline.answer("What is the deadline?").await.unwrap();

        assert_eq!(answer.answer, "No information available.");
        assert!(answer.sources.is_empty());
        assert_eq!(answer.fragments_used, 0);

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("context:\n\n\n\nQuestion: What is the deadline?"));
        assert_eq!(*store.similar_calls.lock().unwrap(), vec![(0.5, 5)]);
    }

    #[tokio::test]
    async fn test_answer_cites_resolved_sources() {
        let store = Arc::new(MemoryStore::with_similar(vec![
            doc_fragment("d1", "El plazo vence el 15 de marzo."),
            fragment("Sin metadatos.", json!({})),
            doc_fragment("d1", "Prórroga de 10 días."),
        ]));
        let generator = Arc::new(RecordingGenerator::replying("El 15 de marzo."));
        let registry = MemoryRegistry::with_records(vec![
            DocumentRecord::new("d1", "Licitación 4-2024.pdf").with_storage_path("public/4.pdf"),
        ]);
        let pipeline = pipeline(StaticEmbedder::default(), store, generator.clone(), registry);

        let answer = pipeline.answer("  ¿Cuándo vence el plazo?  ").await.unwrap();

        assert_eq!(answer.query, "¿Cuándo vence el plazo?");
        assert_eq!(answer.fragments_used, 3);
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[0].name, "Licitación 4-2024.pdf");
        assert_eq!(answer.sources[0].snippets.len(), 2);
        assert_eq!(answer.sources[1].name, "Document (unidentified)");

        let prompt = &generator.prompts()[0];
        assert!(prompt.contains(
            "El plazo vence el 15 de marzo.\nSin metadatos.\nPrórroga de 10 días."
        ));
    }

    #[tokio::test]
    async fn test_overrides_reach_the_store() {
        let store = Arc::new(MemoryStore::default());
        let pipeline = pipeline(
            StaticEmbedder::default(),
            store.clone(),
            Arc::new(RecordingGenerator::replying("ok")),
            MemoryRegistry::default(),
        )
        .with_threshold(0.7)
        .with_limit(12);

        pipeline.answer("q").await.unwrap();
        assert_eq!(*store.similar_calls.lock().unwrap(), vec![(0.7, 12)]);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let pipeline = pipeline(
            StaticEmbedder::default(),
            Arc::new(MemoryStore::default()),
            Arc::new(RecordingGenerator::replying("ok")),
            MemoryRegistry::default(),
        );
        let err = pipeline.answer("   ").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts() {
        let generator = Arc::new(RecordingGenerator::replying("ok"));
        let pipeline = pipeline(
            StaticEmbedder { fail: true },
            Arc::new(MemoryStore::default()),
            generator.clone(),
            MemoryRegistry::default(),
        );

        let err = pipeline.answer("q").await.unwrap_err();
        assert!(matches!(err, PipelineError::Embedding(EmbeddingError::ServerError(_))));
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_failure_aborts() {
        let store = MemoryStore {
            fail_similar: true,
            ..Default::default()
        };
        let generator = Arc::new(RecordingGenerator::replying("ok"));
        let pipeline = pipeline(
            StaticEmbedder::default(),
            Arc::new(store),
            generator.clone(),
            MemoryRegistry::default(),
        );

        let err = pipeline.answer("q").await.unwrap_err();
        assert!(matches!(err, PipelineError::Retrieval(RetrievalError::QueryError(_))));
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let pipeline = pipeline(
            StaticEmbedder::default(),
            Arc::new(MemoryStore::with_similar(vec![doc_fragment("d1", "x")])),
            Arc::new(RecordingGenerator::failing()),
            MemoryRegistry::default(),
        );

        let err = pipeline.answer("q").await.unwrap_err();
        assert!(matches!(err, PipelineError::Generation(GenerationError::ServerError(_))));
    }
}
