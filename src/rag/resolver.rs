//! Source resolution: grouping fragments into de-duplicated citations and
//! normalizing each citation against the document registry.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use super::metadata::{self, Extracted};
use crate::models::{DocumentRecord, Fragment, Source};
use crate::services::DocumentRegistry;

/// Identity two fragments must share to merge into one source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SourceKey {
    Document(String),
    Name(String),
    /// Unattributed fragment, keyed by its position in the input
    Position(usize),
}

impl SourceKey {
    fn for_fragment(fields: &Extracted, position: usize) -> Self {
        match (&fields.document_id, &fields.name) {
            (Some(id), _) => SourceKey::Document(id.clone()),
            (None, Some(name)) => SourceKey::Name(name.clone()),
            (None, None) => SourceKey::Position(position),
        }
    }
}

/// Group fragments into sources in first-seen order.
///
/// Later fragments only fill fields an earlier fragment left unset; they never
/// overwrite a name, page or url that is already there.
pub fn group_sources(fragments: &[Fragment]) -> Vec<Source> {
    let mut positions: HashMap<SourceKey, usize> = HashMap::new();
    let mut sources: Vec<Source> = Vec::new();

    for (position, fragment) in fragments.iter().enumerate() {
        let fields = metadata::extract(fragment);
        let key = SourceKey::for_fragment(&fields, position);

        let index = *positions.entry(key).or_insert_with(|| {
            sources.push(Source::new(fields.document_id.clone(), None));
            sources.len() - 1
        });
        let source = &mut sources[index];

        if let Some(name) = fields.name.filter(|_| source.has_placeholder_name()) {
            source.name = name;
        }
        if source.page.is_none() {
            source.page = fields.page;
        }
        if source.url.is_none() {
            source.url = fields.url;
        }
        if let Some(snippet) = fields.snippet {
            source.snippets.push(snippet);
        }
    }

    sources
}

/// Resolves fragments to registry-backed sources.
#[derive(Clone)]
pub struct SourceResolver {
    registry: Arc<dyn DocumentRegistry>,
}

impl SourceResolver {
    pub fn new(registry: Arc<dyn DocumentRegistry>) -> Self {
        Self { registry }
    }

    /// Group `fragments` into sources and normalize every source.
    ///
    /// Never fails: a source whose lookups fail keeps its best available name.
    pub async fn resolve(&self, fragments: &[Fragment]) -> Vec<Source> {
        let sources = group_sources(fragments);
        tracing::debug!(
            fragments = fragments.len(),
            sources = sources.len(),
            "grouped fragments into sources"
        );
        self.normalize_all(sources).await
    }

    /// Normalize sources concurrently, keeping the input order.
    pub async fn normalize_all(&self, sources: Vec<Source>) -> Vec<Source> {
        let mut tasks = JoinSet::new();
        for (index, source) in sources.iter().cloned().enumerate() {
            let registry = Arc::clone(&self.registry);
            tasks.spawn(async move { (index, normalize(registry.as_ref(), source).await) });
        }

        let mut resolved: Vec<Option<Source>> = vec![None; sources.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, source)) => resolved[index] = Some(source),
                Err(e) => tracing::warn!(error = %e, "source normalization task failed"),
            }
        }

        resolved
            .into_iter()
            .zip(sources)
            .map(|(done, mut original)| {
                done.unwrap_or_else(|| {
                    apply_fallback_name(&mut original);
                    original
                })
            })
            .collect()
    }
}

async fn normalize(registry: &dyn DocumentRegistry, mut source: Source) -> Source {
    let Some(record) = find_record(registry, &source).await else {
        apply_fallback_name(&mut source);
        return source;
    };

    source.adopt(&record);

    if let Some(path) = record.storage_path.as_deref() {
        match registry.public_url(path).await {
            Ok(Some(url)) => source.url = Some(url),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(document = %record.id, error = %e, "failed to resolve public URL")
            }
        }
    }

    source
}

async fn find_record(registry: &dyn DocumentRegistry, source: &Source) -> Option<DocumentRecord> {
    if let Some(id) = source.id.as_deref() {
        match registry.get_by_id(id).await {
            Ok(Some(record)) => return Some(record),
            Ok(None) => tracing::debug!(document = %id, "no registry record for document id"),
            Err(e) => tracing::warn!(document = %id, error = %e, "registry lookup by id failed"),
        }
    }

    if !source.has_placeholder_name() {
        match registry.find_by_exact_name(&source.name).await {
            Ok(Some(record)) => return Some(record),
            Ok(None) => tracing::debug!(name = %source.name, "no registry record for name"),
            Err(e) => {
                tracing::warn!(name = %source.name, error = %e, "registry lookup by name failed")
            }
        }
    }

    None
}

/// Keep a fragment-derived name; replace the placeholder with something
/// that at least carries the id.
fn apply_fallback_name(source: &mut Source) {
    if source.has_placeholder_name() {
        source.name = match source.id.as_deref() {
            Some(id) => format!("Document {id}"),
            None => "Document (unidentified)".to_string(),
        };
    }
}
