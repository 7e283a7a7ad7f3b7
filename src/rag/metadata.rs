//! Schema-tolerant field extraction from fragments.
//!
//! Fragment metadata has no fixed schema: the same logical value may live
//! under several key spellings, inside the metadata bag or as a top-level
//! column. Each logical field is therefore an ordered list of [`Location`]s
//! tried first to last; the first usable value wins.

use serde_json::{Map, Value};

use crate::models::Fragment;

/// One place a value may live on a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Key inside the metadata bag
    Metadata(&'static str),
    /// Top-level column of the stored row
    Field(&'static str),
    /// The fragment content itself
    Content,
}

use Location::{Content, Field, Metadata};

pub const DOCUMENT_ID: &[Location] = &[
    Metadata("documentId"),
    Metadata("document_id"),
    Metadata("doc_id"),
    Metadata("file_id"),
    Field("document_id"),
    Field("doc_id"),
    Field("document"),
    Field("source_id"),
    Field("file_id"),
];

pub const DOCUMENT_NAME: &[Location] = &[
    Metadata("document_name"),
    Metadata("file_name"),
    Metadata("filename"),
    Metadata("title"),
    Field("document_name"),
    Field("file_name"),
    Field("filename"),
    Field("source"),
    Field("title"),
];

/// Snippets prefer the row content; metadata copies of the text are a fallback.
pub const SNIPPET: &[Location] = &[Content, Field("text"), Metadata("text"), Metadata("content")];

pub const PAGE: &[Location] = &[
    Metadata("page"),
    Metadata("page_number"),
    Field("page"),
    Field("page_number"),
];

pub const PUBLIC_URL: &[Location] = &[
    Metadata("public_url"),
    Field("public_url"),
    Field("url"),
    Field("file_url"),
];

/// Metadata keys holding a page-like ordering number.
pub const ORDER_PAGE_KEYS: &[&str] = &["page", "page_number", "pageIndex", "pageIndexNumber"];

/// Metadata keys holding a chunk/sequence ordering number.
pub const ORDER_CHUNK_KEYS: &[&str] = &["chunk_index", "chunkIndex", "index"];

/// Logical fields of one fragment, as used for source grouping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extracted {
    pub document_id: Option<String>,
    pub name: Option<String>,
    pub snippet: Option<String>,
    pub page: Option<u32>,
    pub url: Option<String>,
}

/// Run every extractor over one fragment.
pub fn extract(fragment: &Fragment) -> Extracted {
    Extracted {
        document_id: first_text(fragment, DOCUMENT_ID),
        name: first_text(fragment, DOCUMENT_NAME),
        snippet: first_text(fragment, SNIPPET),
        page: first_page(fragment, PAGE),
        url: first_text(fragment, PUBLIC_URL),
    }
}

fn lookup(fragment: &Fragment, location: Location) -> Option<Value> {
    match location {
        Metadata(key) => fragment.metadata.get(key).cloned(),
        Field(key) => fragment.fields.get(key).cloned(),
        Content => Some(Value::String(fragment.content.clone())),
    }
}

/// Non-empty string, or a number rendered as text.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A number, or a string that parses as one.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

pub fn first_text(fragment: &Fragment, locations: &[Location]) -> Option<String> {
    locations
        .iter()
        .find_map(|&location| lookup(fragment, location).as_ref().and_then(as_text))
}

/// First positive page number; zero and negatives count as absent.
fn first_page(fragment: &Fragment, locations: &[Location]) -> Option<u32> {
    locations.iter().find_map(|&location| {
        lookup(fragment, location)
            .as_ref()
            .and_then(as_number)
            .filter(|n| *n >= 1.0)
            .map(|n| n as u32)
    })
}

/// `metadata.loc.lines.from`, the line-range start some ingesters record.
fn line_range_start(metadata: &Map<String, Value>) -> Option<f64> {
    metadata
        .get("loc")
        .and_then(|loc| loc.get("lines"))
        .and_then(|lines| lines.get("from"))
        .and_then(as_number)
}

/// Ordering number from `metadata`: the line-range start when present,
/// otherwise the first numeric key in `keys`, otherwise 0.
pub fn order_number(metadata: &Map<String, Value>, keys: &[&str]) -> f64 {
    line_range_start(metadata)
        .or_else(|| keys.iter().find_map(|k| metadata.get(*k).and_then(as_number)))
        .unwrap_or(0.0)
}

/// `(page, chunk)` key used to reassemble a document.
pub fn ordering_key(fragment: &Fragment) -> (f64, f64) {
    (
        order_number(&fragment.metadata, ORDER_PAGE_KEYS),
        order_number(&fragment.metadata, ORDER_CHUNK_KEYS),
    )
}

/// Text a fragment contributes to a reassembled document.
pub fn document_text(fragment: &Fragment) -> &str {
    if !fragment.content.is_empty() {
        return &fragment.content;
    }
    fragment
        .metadata
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or("")
}
