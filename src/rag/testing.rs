//! In-memory stand-ins for the external capabilities, shared by pipeline tests.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{EmbeddingError, GenerationError, RegistryError, RetrievalError};
use crate::models::{DocumentFilter, DocumentRecord, Fragment};
use crate::services::{DocumentRegistry, Embedder, FragmentStore, Generator, LookupStrategy};

pub(crate) fn fragment(content: &str, metadata: Value) -> Fragment {
    match metadata {
        Value::Object(map) => Fragment::new(content, map),
        _ => Fragment::new(content, Default::default()),
    }
}

pub(crate) fn doc_fragment(document_id: &str, content: &str) -> Fragment {
    fragment(content, json!({ "documentId": document_id }))
}

#[derive(Default)]
pub(crate) struct StaticEmbedder {
    pub fail: bool,
}

#[async_trait]
impl Embedder for StaticEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.fail {
            return Err(EmbeddingError::ServerError("status 503: unavailable".to_string()));
        }
        Ok(vec![0.1, 0.2, 0.3])
    }
}

/// Fragment store answering from fixed data.
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub similar: Vec<Fragment>,
    pub by_strategy: HashMap<LookupStrategy, Result<Vec<Fragment>, String>>,
    pub fail_similar: bool,
    pub similar_calls: Mutex<Vec<(f32, u32)>>,
    pub lookups: Mutex<Vec<LookupStrategy>>,
    pub delays: HashMap<LookupStrategy, Duration>,
    pub in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl MemoryStore {
    pub fn with_similar(similar: Vec<Fragment>) -> Self {
        Self {
            similar,
            ..Default::default()
        }
    }

    pub fn with_strategy(mut self, strategy: LookupStrategy, fragments: Vec<Fragment>) -> Self {
        self.by_strategy.insert(strategy, Ok(fragments));
        self
    }

    pub fn with_failing_strategy(mut self, strategy: LookupStrategy) -> Self {
        self.by_strategy
            .insert(strategy, Err("relation does not exist".to_string()));
        self
    }

    /// Make `strategy` answer only after `delay`.
    pub fn with_delay(mut self, strategy: LookupStrategy, delay: Duration) -> Self {
        self.delays.insert(strategy, delay);
        self
    }

    /// Delay each of `strategies` that has no delay of its own.
    pub fn with_lookup_latency(mut self, strategies: &[LookupStrategy], delay: Duration) -> Self {
        for strategy in strategies {
            self.delays.entry(strategy.clone()).or_insert(delay);
        }
        self
    }
}

#[async_trait]
impl FragmentStore for MemoryStore {
    async fn health_check(&self) -> Result<bool, RetrievalError> {
        Ok(true)
    }

    async fn retrieve_similar(
        &self,
        _query_vector: Vec<f32>,
        threshold: f32,
        limit: u32,
    ) -> Result<Vec<Fragment>, RetrievalError> {
        self.similar_calls.lock().unwrap().push((threshold, limit));
        if self.fail_similar {
            return Err(RetrievalError::QueryError("function match_documents does not exist".to_string()));
        }
        Ok(self.similar.iter().take(limit as usize).cloned().collect())
    }

    async fn fragments_by(
        &self,
        strategy: &LookupStrategy,
        _document_id: &str,
    ) -> Result<Vec<Fragment>, RetrievalError> {
        self.lookups.lock().unwrap().push(strategy.clone());
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(strategy) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.by_strategy.get(strategy) {
            Some(Ok(fragments)) => Ok(fragments.clone()),
            Some(Err(message)) => Err(RetrievalError::QueryError(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}

/// Document registry over a fixed record set.
#[derive(Default)]
pub(crate) struct MemoryRegistry {
    pub records: Vec<DocumentRecord>,
    pub failing_ids: HashSet<String>,
    pub id_lookups: Mutex<Vec<String>>,
    pub name_lookups: Mutex<Vec<String>>,
    pub delays: HashMap<String, Duration>,
}

impl MemoryRegistry {
    pub fn with_records(records: Vec<DocumentRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    /// Make the id lookup of `id` answer only after `delay`.
    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }
}

#[async_trait]
impl DocumentRegistry for MemoryRegistry {
    async fn get_by_id(&self, id: &str) -> Result<Option<DocumentRecord>, RegistryError> {
        self.id_lookups.lock().unwrap().push(id.to_string());
        if let Some(delay) = self.delays.get(id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_ids.contains(id) {
            return Err(RegistryError::QueryError("connection reset".to_string()));
        }
        Ok(self.records.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_exact_name(
        &self,
        name: &str,
    ) -> Result<Option<DocumentRecord>, RegistryError> {
        self.name_lookups.lock().unwrap().push(name.to_string());
        Ok(self.records.iter().find(|r| r.file_name == name).cloned())
    }

    async fn public_url(&self, storage_path: &str) -> Result<Option<String>, RegistryError> {
        if storage_path.starts_with("broken/") {
            return Err(RegistryError::QueryError("storage unavailable".to_string()));
        }
        Ok(Some(format!("https://storage.test/documents/{storage_path}")))
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRecord>, RegistryError> {
        Ok(self
            .records
            .iter()
            .filter(|r| filter.owner.as_deref().is_none_or(|o| r.is_owned_by(o)))
            .cloned()
            .collect())
    }

    async fn with_key_dates(
        &self,
        owner: Option<&str>,
    ) -> Result<Vec<DocumentRecord>, RegistryError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.key_dates.is_some())
            .filter(|r| owner.is_none_or(|o| r.is_owned_by(o)))
            .cloned()
            .collect())
    }
}

/// Generator that records every prompt it receives.
pub(crate) struct RecordingGenerator {
    pub reply: String,
    pub fail: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::replying("")
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(GenerationError::ServerError(
                "status 429: Resource has been exhausted".to_string(),
            ));
        }
        Ok(self.reply.clone())
    }
}
