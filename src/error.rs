//! Error types for the document RAG backend.

use thiserror::Error;

/// SQLSTATE raised when `statement_timeout` cancels a query.
const QUERY_CANCELED: &str = "57014";

/// Errors related to query embedding.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding API key is not configured (set GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("failed to build embedding client: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

/// Errors related to text generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation API key is not configured (set GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("failed to build generation client: {0}")]
    ConnectionError(String),

    #[error("generation server error: {0}")]
    ServerError(String),

    #[error("generation request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("model returned no text (finish reason: {0})")]
    EmptyResponse(String),

    #[error("generation timeout")]
    Timeout,
}

/// Errors related to fragment store operations.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("failed to connect to PostgreSQL: {0}")]
    ConnectionError(String),

    #[error("fragment query error: {0}")]
    QueryError(String),

    #[error("invalid SQL identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid fragment row: {0}")]
    InvalidRow(String),

    #[error("fragment store timeout")]
    Timeout,
}

impl From<sqlx::Error> for RetrievalError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => RetrievalError::Timeout,
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some(QUERY_CANCELED) => {
                RetrievalError::Timeout
            }
            sqlx::Error::Io(e) => RetrievalError::ConnectionError(e.to_string()),
            other => RetrievalError::QueryError(other.to_string()),
        }
    }
}

/// Errors related to the document registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to connect to PostgreSQL: {0}")]
    ConnectionError(String),

    #[error("document query error: {0}")]
    QueryError(String),

    #[error("invalid document record: {0}")]
    InvalidRecord(String),

    #[error("document registry timeout")]
    Timeout,
}

impl From<sqlx::Error> for RegistryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => RegistryError::Timeout,
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some(QUERY_CANCELED) => {
                RegistryError::Timeout
            }
            sqlx::Error::Io(e) => RegistryError::ConnectionError(e.to_string()),
            sqlx::Error::ColumnDecode { index, source } => {
                RegistryError::InvalidRecord(format!("column {index}: {source}"))
            }
            other => RegistryError::QueryError(other.to_string()),
        }
    }
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// What a pipeline failed to find.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("document not found: {0}")]
    Document(String),

    #[error("no fragments found for document: {0}")]
    Fragments(String),

    #[error("no public URL for document: {0}")]
    PublicUrl(String),
}

/// Errors surfaced by the query and summarization pipelines.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error("permission denied for document: {document_id}")]
    Forbidden { document_id: String },
}

impl PipelineError {
    /// HTTP-style status code a caller can map this error onto.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::InvalidQuery(_) => 400,
            PipelineError::NotFound(_) => 404,
            PipelineError::Forbidden { .. } => 403,
            PipelineError::Embedding(EmbeddingError::Timeout)
            | PipelineError::Generation(GenerationError::Timeout)
            | PipelineError::Retrieval(RetrievalError::Timeout)
            | PipelineError::Registry(RegistryError::Timeout) => 504,
            _ => 500,
        }
    }
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("fragment store error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}
