mod documents;
mod embedding;
mod gemini;
mod generation;
pub mod store;

pub use documents::DocumentService;
pub use embedding::{Embedder, GeminiEmbedder};
pub use generation::{GeminiGenerator, Generator};
pub use store::{
    COMPLETED_STATUS, DocumentRegistry, FragmentStore, LookupStrategy, PostgresBackend,
    validate_identifier,
};
