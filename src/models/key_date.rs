//! Important dates extracted from documents by the ingestion workflow.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Urgency of an upcoming date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    Medium,
    MediumHigh,
    High,
}

impl Priority {
    /// One level more urgent, saturating at `High`.
    pub fn raised(self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::MediumHigh,
            Priority::MediumHigh | Priority::High => Priority::High,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::MediumHigh => write!(f, "medium-high"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// One dated entry of a document's `key_dates`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDate {
    /// `<document id>-<entry index>`
    pub id: String,
    pub date: NaiveDate,
    /// Days from today (negative for past dates)
    pub days_difference: i64,
    pub description: String,
    pub document_id: String,
    pub document_name: String,
    #[serde(rename = "type")]
    pub date_type: String,
    pub priority: Priority,
}

/// Result of a key-date listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDateList {
    /// Dates sorted ascending, capped at the requested limit
    pub dates: Vec<KeyDate>,
    /// Number of dates before the limit was applied
    pub total: usize,
    /// Whether past dates were filtered out
    pub upcoming: bool,
}

/// Aggregate counts over all key dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDateStats {
    pub total_dates: usize,
    pub upcoming_dates: usize,
    pub this_week: usize,
    pub this_month: usize,
    pub documents_with_dates: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_raised() {
        assert_eq!(Priority::Low.raised(), Priority::Medium);
        assert_eq!(Priority::Medium.raised(), Priority::MediumHigh);
        assert_eq!(Priority::MediumHigh.raised(), Priority::High);
        assert_eq!(Priority::High.raised(), Priority::High);
    }

    #[test]
    fn test_priority_serialization() {
        let json = serde_json::to_string(&Priority::MediumHigh).unwrap();
        assert_eq!(json, "\"medium-high\"");
        assert_eq!(Priority::MediumHigh.to_string(), "medium-high");
    }
}
