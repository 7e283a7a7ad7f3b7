//! Pipeline results and output formats.

use serde::{Deserialize, Serialize};

use super::source::Source;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// A generated answer grounded in retrieved fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Question that was asked
    pub query: String,

    /// Generated answer text
    pub answer: String,

    /// Distinct source documents, in first-seen order
    pub sources: Vec<Source>,

    /// Number of fragments that went into the context
    pub fragments_used: usize,

    /// Wall-clock time of the whole pipeline in milliseconds
    pub duration_ms: u64,
}

/// A generated whole-document summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub document_id: String,

    /// Generated bullet summary
    pub summary: String,

    /// Whether the document text was cut before generation
    pub truncated: bool,

    /// Number of fragments reassembled into the document text
    pub fragment_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "md".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_summary_serializes_flag() {
        let summary = Summary {
            document_id: "d1".to_string(),
            summary: "- a".to_string(),
            truncated: true,
            fragment_count: 3,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["truncated"], true);
        assert_eq!(json["summary"], "- a");
    }
}
