mod answer;
mod config;
mod fragment;
mod key_date;
mod source;

pub use answer::{Answer, OutputFormat, Summary};
pub use config::{
    Config, ConfigSource, DEFAULT_ANSWER_MODEL, DEFAULT_BUCKET, DEFAULT_DATABASE_URL,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_GEMINI_API_BASE, DEFAULT_MATCH_COUNT,
    DEFAULT_MATCH_THRESHOLD, DEFAULT_SUMMARY_MAX_CHARS, DEFAULT_SUMMARY_MODEL, DatabaseConfig,
    GeminiConfig, LogConfig, OutputConfig, RagConfig, ResolvedConfig, StorageConfig,
    SummaryConfig,
};
pub use fragment::Fragment;
pub use key_date::{KeyDate, KeyDateList, KeyDateStats, Priority};
pub use source::{DocumentFilter, DocumentRecord, DocumentSort, Source, UNKNOWN_DOCUMENT};
