//! Key dates: deadlines and other dated entries the ingestion workflow
//! extracted into each document's `key_dates` column.

use chrono::{DateTime, Days, Local, Months, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::models::{DocumentRecord, KeyDate, KeyDateList, KeyDateStats, Priority};
use crate::services::DocumentRegistry;

pub const DEFAULT_LIMIT: usize = 10;

const DEFAULT_DESCRIPTION: &str = "Fecha importante";
const DEFAULT_TYPE: &str = "general";

/// Type keywords that make a date one level more urgent.
const URGENT_TYPES: &[&str] = &["vencimiento", "deadline", "urgente", "plazo"];

const DATE_KEYS: &[&str] = &["date", "fecha", "timestamp"];
const DESCRIPTION_KEYS: &[&str] = &["description", "context", "texto"];
const TYPE_KEYS: &[&str] = &["type", "tipo"];

/// Urgency from the number of days left and the entry type.
pub fn priority_for(days_until: i64, date_type: &str) -> Priority {
    let base = match days_until {
        ..=3 => Priority::High,
        4..=7 => Priority::MediumHigh,
        8..=30 => Priority::Medium,
        _ => Priority::Low,
    };

    let date_type = date_type.to_lowercase();
    if URGENT_TYPES.iter().any(|t| date_type.contains(t)) {
        base.raised()
    } else {
        base
    }
}

fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

fn parse_date_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        _ => None,
    }
}

/// Date of one `key_dates` entry: a bare string, or the first of
/// `date`, `fecha`, `timestamp` an object carries.
pub fn entry_date(entry: &Value) -> Option<NaiveDate> {
    match entry {
        Value::String(_) => parse_date_value(entry),
        Value::Object(map) => DATE_KEYS
            .iter()
            .find_map(|k| map.get(*k).filter(|v| !v.is_null()))
            .and_then(parse_date_value),
        _ => None,
    }
}

fn entry_text(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| entry.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// `key_dates` holds either an array of entries or a single entry object.
fn entries(key_dates: &Value) -> Vec<&Value> {
    match key_dates {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![key_dates],
        _ => Vec::new(),
    }
}

/// Every parseable key date across `records`, sorted by date.
pub fn collect_dates(records: &[DocumentRecord], today: NaiveDate) -> Vec<KeyDate> {
    let mut dates = Vec::new();

    for record in records {
        let Some(key_dates) = record.key_dates.as_ref() else {
            continue;
        };

        for (index, entry) in entries(key_dates).into_iter().enumerate() {
            let Some(date) = entry_date(entry) else {
                tracing::warn!(document = %record.id, index, "unrecognized key date entry, skipping");
                continue;
            };

            let days_difference = (date - today).num_days();
            let date_type = entry_text(entry, TYPE_KEYS).unwrap_or_else(|| DEFAULT_TYPE.to_string());

            dates.push(KeyDate {
                id: format!("{}-{}", record.id, index),
                date,
                days_difference,
                description: entry_text(entry, DESCRIPTION_KEYS)
                    .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
                document_id: record.id.clone(),
                document_name: record.file_name.clone(),
                priority: priority_for(days_difference, &date_type),
                date_type,
            });
        }
    }

    dates.sort_by_key(|d| d.date);
    dates
}

/// Dates sorted ascending and capped at `limit`; `upcoming` drops past dates.
pub fn list_dates(
    records: &[DocumentRecord],
    today: NaiveDate,
    upcoming: bool,
    limit: usize,
) -> KeyDateList {
    let mut dates: Vec<KeyDate> = collect_dates(records, today)
        .into_iter()
        .filter(|d| !upcoming || d.date >= today)
        .collect();
    let total = dates.len();
    dates.truncate(limit);

    KeyDateList {
        dates,
        total,
        upcoming,
    }
}

pub fn date_stats(records: &[DocumentRecord], today: NaiveDate) -> KeyDateStats {
    let next_week = today.checked_add_days(Days::new(7)).unwrap_or(NaiveDate::MAX);
    let next_month = today.checked_add_months(Months::new(1)).unwrap_or(NaiveDate::MAX);

    let dates = collect_dates(records, today);
    let upcoming: Vec<&KeyDate> = dates.iter().filter(|d| d.date >= today).collect();

    KeyDateStats {
        total_dates: dates.len(),
        upcoming_dates: upcoming.len(),
        this_week: upcoming.iter().filter(|d| d.date <= next_week).count(),
        this_month: upcoming.iter().filter(|d| d.date <= next_month).count(),
        documents_with_dates: records.len(),
    }
}

/// Key-date queries over the document registry.
#[derive(Clone)]
pub struct KeyDatesService {
    registry: Arc<dyn DocumentRegistry>,
}

impl KeyDatesService {
    pub fn new(registry: Arc<dyn DocumentRegistry>) -> Self {
        Self { registry }
    }

    pub async fn list(
        &self,
        owner: Option<&str>,
        upcoming: bool,
        limit: usize,
    ) -> Result<KeyDateList, RegistryError> {
        let records = self.registry.with_key_dates(owner).await?;
        tracing::debug!(documents = records.len(), "documents with key dates");
        Ok(list_dates(&records, Local::now().date_naive(), upcoming, limit))
    }

    pub async fn stats(&self, owner: Option<&str>) -> Result<KeyDateStats, RegistryError> {
        let records = self.registry.with_key_dates(owner).await?;
        Ok(date_stats(&records, Local::now().date_naive()))
    }
}
