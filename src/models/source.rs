//! Source citations and the document records they resolve to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display name given to a source no fragment could name.
pub const UNKNOWN_DOCUMENT: &str = "Unknown document";

/// A de-duplicated citation aggregating one or more fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Document identifier, when any fragment carried one.
    pub id: Option<String>,

    /// Display name (canonical file name once resolved against the registry).
    pub name: String,

    /// Content of every fragment that mapped to this source, in encounter order.
    pub snippets: Vec<String>,

    /// Page hint taken from the first fragment that had one.
    pub page: Option<u32>,

    /// Public link to the stored file.
    pub url: Option<String>,

    /// Storage path from the registry record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
}

impl Source {
    /// Create an empty source with the given identity.
    pub fn new(id: Option<String>, name: Option<String>) -> Self {
        Self {
            id,
            name: name.unwrap_or_else(|| UNKNOWN_DOCUMENT.to_string()),
            snippets: Vec::new(),
            page: None,
            url: None,
            storage_path: None,
        }
    }

    /// Whether the display name is still the generic placeholder.
    pub fn has_placeholder_name(&self) -> bool {
        self.name == UNKNOWN_DOCUMENT
    }

    /// Adopt a registry record's canonical identity.
    pub fn adopt(&mut self, record: &DocumentRecord) {
        self.id = Some(record.id.clone());
        self.name = record.file_name.clone();
        self.storage_path = record.storage_path.clone();
    }
}

/// A document as stored in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,

    /// Canonical file name as uploaded.
    pub file_name: String,

    /// Location of the file inside the storage bucket.
    pub storage_path: Option<String>,

    /// Owner of the document.
    pub user_id: Option<String>,

    /// Processing status set by the ingestion workflow.
    pub status: Option<String>,

    pub uploaded_at: Option<DateTime<Utc>>,

    /// Dates extracted by the ingestion workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_dates: Option<Value>,
}

impl DocumentRecord {
    /// Create a minimal record.
    pub fn new(id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            storage_path: None,
            user_id: None,
            status: None,
            uploaded_at: None,
            key_dates: None,
        }
    }

    /// Set the storage path.
    pub fn with_storage_path(mut self, path: impl Into<String>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Set the owner.
    pub fn with_owner(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Whether the given caller owns this document.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

/// Sort order for document listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSort {
    /// Newest uploads first
    #[default]
    UploadedDesc,
    /// Oldest uploads first
    UploadedAsc,
    /// File name A-Z
    NameAsc,
    /// File name Z-A
    NameDesc,
}

impl std::str::FromStr for DocumentSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uploaded_desc" => Ok(DocumentSort::UploadedDesc),
            "uploaded_asc" => Ok(DocumentSort::UploadedAsc),
            "name_asc" => Ok(DocumentSort::NameAsc),
            "name_desc" => Ok(DocumentSort::NameDesc),
            _ => Err(format!("unknown sort order: {}", s)),
        }
    }
}

impl std::fmt::Display for DocumentSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentSort::UploadedDesc => write!(f, "uploaded_desc"),
            DocumentSort::UploadedAsc => write!(f, "uploaded_asc"),
            DocumentSort::NameAsc => write!(f, "name_asc"),
            DocumentSort::NameDesc => write!(f, "name_desc"),
        }
    }
}

/// Filters for document listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    /// Only documents owned by this user
    pub owner: Option<String>,
    /// Exact processing status
    pub status: Option<String>,
    /// Case-insensitive substring of the file name
    pub name_contains: Option<String>,
    pub sort: DocumentSort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_placeholder_name() {
        let source = Source::new(Some("doc-1".to_string()), None);
        assert!(source.has_placeholder_name());

        let named = Source::new(None, Some("contrato.pdf".to_string()));
        assert!(!named.has_placeholder_name());
    }

    #[test]
    fn test_source_adopt_record() {
        let mut source = Source::new(None, Some("contrato".to_string()));
        let record = DocumentRecord::new("doc-9", "contrato.pdf").with_storage_path("public/1-contrato.pdf");
        source.adopt(&record);
        assert_eq!(source.id.as_deref(), Some("doc-9"));
        assert_eq!(source.name, "contrato.pdf");
        assert_eq!(source.storage_path.as_deref(), Some("public/1-contrato.pdf"));
    }

    #[test]
    fn test_document_sort_parse() {
        assert_eq!("name_asc".parse::<DocumentSort>().unwrap(), DocumentSort::NameAsc);
        assert_eq!(
            "UPLOADED_ASC".parse::<DocumentSort>().unwrap(),
            DocumentSort::UploadedAsc
        );
        assert!("newest".parse::<DocumentSort>().is_err());
    }

    #[test]
    fn test_ownership() {
        let record = DocumentRecord::new("d", "f").with_owner("u1");
        assert!(record.is_owned_by("u1"));
        assert!(!record.is_owned_by("u2"));
        assert!(!DocumentRecord::new("d", "f").is_owned_by("u1"));
    }
}
