//! By-document fragment lookup over a fallback chain of query shapes.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::NotFound;
use crate::models::{DatabaseConfig, Fragment};
use crate::services::{FragmentStore, LookupStrategy};

/// Column holding the owning document in fallback tables.
const DOCUMENT_ID_COLUMN: &str = "document_id";

/// Strategies in flight when no pool size is given.
const DEFAULT_CONCURRENCY: usize = 4;

/// Ordered list of lookup strategies; earlier entries win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupChain {
    strategies: Vec<LookupStrategy>,
}

impl LookupChain {
    pub fn new(strategies: Vec<LookupStrategy>) -> Self {
        Self { strategies }
    }

    /// Metadata keys on the fragment table, then the chunks function, then
    /// each fallback table by column and by metadata keys.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let metadata_keys = |table: &str| {
            config
                .document_id_keys
                .iter()
                .map(|key| LookupStrategy::MetadataKey {
                    table: table.to_string(),
                    key: key.clone(),
                })
                .collect::<Vec<_>>()
        };

        let mut strategies = metadata_keys(&config.fragment_table);
        strategies.push(LookupStrategy::Function {
            name: config.chunks_function.clone(),
        });
        for table in &config.fallback_tables {
            strategies.push(LookupStrategy::Column {
                table: table.clone(),
                column: DOCUMENT_ID_COLUMN.to_string(),
            });
            strategies.extend(metadata_keys(table));
        }

        Self { strategies }
    }

    pub fn strategies(&self) -> &[LookupStrategy] {
        &self.strategies
    }
}

/// Fragments found for a document and the strategy that found them.
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub strategy: LookupStrategy,
    pub fragments: Vec<Fragment>,
}

/// Runs a [`LookupChain`] against a fragment store.
#[derive(Clone)]
pub struct FragmentLookup {
    store: Arc<dyn FragmentStore>,
    chain: LookupChain,
    concurrency: usize,
}

impl FragmentLookup {
    pub fn new(store: Arc<dyn FragmentStore>, chain: LookupChain) -> Self {
        Self {
            store,
            chain,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Cap how many strategies query the store at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn chain(&self) -> &LookupChain {
        &self.chain
    }

    /// Fragments of `document_id` from the first strategy that yields any.
    ///
    /// Strategies run concurrently, at most `concurrency` at a time, but
    /// results are taken in chain order: a later strategy never wins over an
    /// earlier non-empty one. A failing strategy counts as empty. Results from
    /// different strategies are never merged. Returning, or dropping the
    /// future, aborts every strategy still in flight.
    pub async fn find(&self, document_id: &str) -> Result<LookupOutcome, NotFound> {
        let strategies = self.chain.strategies();
        let permits = Arc::new(Semaphore::new(self.concurrency));

        let mut tasks = JoinSet::new();
        let mut task_index = HashMap::with_capacity(strategies.len());
        for (index, strategy) in strategies.iter().cloned().enumerate() {
            let store = Arc::clone(&self.store);
            let permits = Arc::clone(&permits);
            let document_id = document_id.to_string();
            let handle = tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                store.fragments_by(&strategy, &document_id).await
            });
            task_index.insert(handle.id(), index);
        }

        let mut settled: Vec<Option<Vec<Fragment>>> = vec![None; strategies.len()];
        let mut next = 0;
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, fragments) = match joined {
                Ok((id, Ok(fragments))) => (id, fragments),
                Ok((id, Err(e))) => {
                    if let Some(strategy) = task_index.get(&id).map(|&i| &strategies[i]) {
                        tracing::warn!(%strategy, error = %e, "fragment lookup strategy failed");
                    }
                    (id, Vec::new())
                }
                Err(e) => {
                    tracing::warn!(error = %e, "fragment lookup task failed");
                    (e.id(), Vec::new())
                }
            };
            let Some(&index) = task_index.get(&id) else {
                continue;
            };
            settled[index] = Some(fragments);

            while let Some(fragments) = settled.get_mut(next).and_then(Option::take) {
                let strategy = &strategies[next];
                if !fragments.is_empty() {
                    tracing::debug!(%strategy, count = fragments.len(), "fragments found");
                    return Ok(LookupOutcome {
                        strategy: strategy.clone(),
                        fragments,
                    });
                }
                tracing::debug!(%strategy, "no fragments");
                next += 1;
            }
        }

        Err(NotFound::Fragments(document_id.to_string()))
    }
}
