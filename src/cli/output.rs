use serde::Serialize;
use std::fmt::Write as FmtWrite;

use crate::models::{
    Answer, DocumentRecord, KeyDateList, KeyDateStats, OutputFormat, Summary,
};
use crate::utils::preview;

const SNIPPET_PREVIEW_CHARS: usize = 200;

pub trait Formatter {
    fn format_answer(&self, answer: &Answer) -> String;
    fn format_summary(&self, summary: &Summary) -> String;
    fn format_documents(&self, documents: &[DocumentRecord]) -> String;
    fn format_document(&self, document: &DocumentRecord) -> String;
    fn format_key_dates(&self, dates: &KeyDateList) -> String;
    fn format_key_date_stats(&self, stats: &KeyDateStats) -> String;
    fn format_fragments(&self, report: &FragmentReport) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub database_url: String,
    pub database_connected: bool,
    pub api_key_configured: bool,
    pub embedding_model: String,
    pub answer_model: String,
    pub summary_model: String,
    pub storage_configured: bool,
}

/// Fragments found for one document, as the summarizer would read them.
#[derive(Debug, Clone, Serialize)]
pub struct FragmentReport {
    pub document_id: String,
    /// Lookup strategy that produced the fragments
    pub strategy: String,
    pub fragments: Vec<FragmentRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FragmentRow {
    pub id: Option<String>,
    pub page: f64,
    pub chunk: f64,
    pub chars: usize,
    pub preview: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Run a writer against a fresh buffer. Writing to a `String` cannot fail.
fn render(write: impl FnOnce(&mut String) -> std::fmt::Result) -> String {
    let mut output = String::new();
    write(&mut output).map(|()| output).unwrap_or_default()
}

fn uploaded(document: &DocumentRecord) -> String {
    document
        .uploaded_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_answer(&self, answer: &Answer) -> String {
        render(|out| {
            writeln!(out, "{}", answer.answer.trim_end())?;
            writeln!(out)?;

            if answer.sources.is_empty() {
                writeln!(out, "No sources ({} fragments, {}ms)", answer.fragments_used, answer.duration_ms)?;
                return Ok(());
            }

            writeln!(
                out,
                "Sources ({} from {} fragments, {}ms)",
                answer.sources.len(),
                answer.fragments_used,
                answer.duration_ms
            )?;
            writeln!(out, "-------")?;
            for (i, source) in answer.sources.iter().enumerate() {
                write!(out, "{}. {}", i + 1, source.name)?;
                if let Some(page) = source.page {
                    write!(out, " (p. {page})")?;
                }
                writeln!(out)?;
                if let Some(ref url) = source.url {
                    writeln!(out, "   {url}")?;
                }
                for snippet in &source.snippets {
                    writeln!(out, "   > {}", preview(snippet, SNIPPET_PREVIEW_CHARS))?;
                }
            }
            Ok(())
        })
    }

    fn format_summary(&self, summary: &Summary) -> String {
        render(|out| {
            if summary.truncated {
                writeln!(out, "(document text was truncated before summarizing)")?;
            }
            writeln!(out, "{}", summary.summary.trim_end())
        })
    }

    fn format_documents(&self, documents: &[DocumentRecord]) -> String {
        if documents.is_empty() {
            return "No documents found.\n".to_string();
        }

        render(|out| {
            writeln!(out, "Documents ({})", documents.len())?;
            writeln!(out, "---------")?;
            for doc in documents {
                writeln!(
                    out,
                    "{}  {}  [{}]  {}",
                    uploaded(doc),
                    doc.file_name,
                    doc.status.as_deref().unwrap_or("-"),
                    doc.id
                )?;
            }
            Ok(())
        })
    }

    fn format_document(&self, document: &DocumentRecord) -> String {
        render(|out| {
            writeln!(out, "ID:           {}", document.id)?;
            writeln!(out, "File name:    {}", document.file_name)?;
            writeln!(out, "Status:       {}", document.status.as_deref().unwrap_or("-"))?;
            writeln!(out, "Owner:        {}", document.user_id.as_deref().unwrap_or("-"))?;
            writeln!(out, "Uploaded:     {}", uploaded(document))?;
            writeln!(out, "Storage path: {}", document.storage_path.as_deref().unwrap_or("-"))
        })
    }

    fn format_key_dates(&self, dates: &KeyDateList) -> String {
        if dates.dates.is_empty() {
            return "No key dates found.\n".to_string();
        }

        render(|out| {
            writeln!(out, "Key dates ({} of {})", dates.dates.len(), dates.total)?;
            writeln!(out, "---------")?;
            for date in &dates.dates {
                writeln!(
                    out,
                    "{}  {:>5}d  [{}]  {} ({})",
                    date.date, date.days_difference, date.priority, date.description, date.date_type
                )?;
                writeln!(out, "                   {}", date.document_name)?;
            }
            Ok(())
        })
    }

    fn format_key_date_stats(&self, stats: &KeyDateStats) -> String {
        render(|out| {
            writeln!(out, "Total dates:          {}", stats.total_dates)?;
            writeln!(out, "Upcoming:             {}", stats.upcoming_dates)?;
            writeln!(out, "Within a week:        {}", stats.this_week)?;
            writeln!(out, "Within a month:       {}", stats.this_month)?;
            writeln!(out, "Documents with dates: {}", stats.documents_with_dates)
        })
    }

    fn format_fragments(&self, report: &FragmentReport) -> String {
        render(|out| {
            writeln!(
                out,
                "{} fragments for {} via {}",
                report.fragments.len(),
                report.document_id,
                report.strategy
            )?;
            writeln!(out)?;
            for (i, row) in report.fragments.iter().enumerate() {
                writeln!(
                    out,
                    "{}. page {} chunk {} ({} chars) id={}",
                    i + 1,
                    row.page,
                    row.chunk,
                    row.chars,
                    row.id.as_deref().unwrap_or("-")
                )?;
                writeln!(out, "   {}", row.preview)?;
                let keys: Vec<&str> = row.metadata.keys().map(String::as_str).collect();
                if !keys.is_empty() {
                    writeln!(out, "   metadata: {}", keys.join(", "))?;
                }
            }
            Ok(())
        })
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        render(|out| {
            writeln!(out, "Status")?;
            writeln!(out, "------")?;

            let db = if status.database_connected {
                "[CONNECTED]"
            } else {
                "[DISCONNECTED]"
            };
            writeln!(out, "Database:      {db}")?;
            writeln!(out, "  URL:         {}", status.database_url)?;
            writeln!(out)?;

            let key = if status.api_key_configured {
                "[CONFIGURED]"
            } else {
                "[MISSING]"
            };
            writeln!(out, "Gemini API:    {key}")?;
            writeln!(out, "  Embedding:   {}", status.embedding_model)?;
            writeln!(out, "  Answers:     {}", status.answer_model)?;
            writeln!(out, "  Summaries:   {}", status.summary_model)?;
            writeln!(out)?;

            let storage = if status.storage_configured {
                "[CONFIGURED]"
            } else {
                "[NOT CONFIGURED]"
            };
            writeln!(out, "Public links:  {storage}")
        })
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        json.unwrap_or_else(|e| serde_json::json!({"error": e.to_string()}).to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_answer(&self, answer: &Answer) -> String {
        self.to_json(answer)
    }

    fn format_summary(&self, summary: &Summary) -> String {
        self.to_json(summary)
    }

    fn format_documents(&self, documents: &[DocumentRecord]) -> String {
        self.to_json(&serde_json::json!({ "documents": documents, "total": documents.len() }))
    }

    fn format_document(&self, document: &DocumentRecord) -> String {
        self.to_json(document)
    }

    fn format_key_dates(&self, dates: &KeyDateList) -> String {
        self.to_json(dates)
    }

    fn format_key_date_stats(&self, stats: &KeyDateStats) -> String {
        self.to_json(stats)
    }

    fn format_fragments(&self, report: &FragmentReport) -> String {
        self.to_json(report)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        self.to_json(status)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_answer(&self, answer: &Answer) -> String {
        render(|out| {
            writeln!(out, "## Answer\n")?;
            writeln!(out, "**Question:** {}\n", answer.query)?;
            writeln!(out, "{}\n", answer.answer.trim_end())?;

            if answer.sources.is_empty() {
                return writeln!(out, "*No sources.*");
            }

            writeln!(out, "### Sources\n")?;
            for source in &answer.sources {
                match source.url {
                    Some(ref url) => write!(out, "- [{}]({})", source.name, url)?,
                    None => write!(out, "- {}", source.name)?,
                }
                if let Some(page) = source.page {
                    write!(out, ", p. {page}")?;
                }
                writeln!(out)?;
                for snippet in &source.snippets {
                    writeln!(out, "  > {}", preview(snippet, SNIPPET_PREVIEW_CHARS))?;
                }
            }
            Ok(())
        })
    }

    fn format_summary(&self, summary: &Summary) -> String {
        render(|out| {
            writeln!(out, "## Summary\n")?;
            if summary.truncated {
                writeln!(out, "> Document text was truncated before summarizing.\n")?;
            }
            writeln!(out, "{}", summary.summary.trim_end())
        })
    }

    fn format_documents(&self, documents: &[DocumentRecord]) -> String {
        if documents.is_empty() {
            return "## Documents\n\n*No documents found.*\n".to_string();
        }

        render(|out| {
            writeln!(out, "## Documents\n")?;
            writeln!(out, "| File | Status | Uploaded | ID |")?;
            writeln!(out, "|------|--------|----------|----|")?;
            for doc in documents {
                writeln!(
                    out,
                    "| {} | {} | {} | `{}` |",
                    doc.file_name,
                    doc.status.as_deref().unwrap_or("-"),
                    uploaded(doc),
                    doc.id
                )?;
            }
            Ok(())
        })
    }

    fn format_document(&self, document: &DocumentRecord) -> String {
        render(|out| {
            writeln!(out, "## {}\n", document.file_name)?;
            writeln!(out, "- **ID:** `{}`", document.id)?;
            writeln!(out, "- **Status:** {}", document.status.as_deref().unwrap_or("-"))?;
            writeln!(out, "- **Uploaded:** {}", uploaded(document))?;
            if let Some(ref path) = document.storage_path {
                writeln!(out, "- **Storage path:** `{path}`")?;
            }
            Ok(())
        })
    }

    fn format_key_dates(&self, dates: &KeyDateList) -> String {
        if dates.dates.is_empty() {
            return "## Key Dates\n\n*No key dates found.*\n".to_string();
        }

        render(|out| {
            writeln!(out, "## Key Dates\n")?;
            writeln!(out, "| Date | Days | Priority | Description | Document |")?;
            writeln!(out, "|------|------|----------|-------------|----------|")?;
            for date in &dates.dates {
                writeln!(
                    out,
                    "| {} | {} | {} | {} | {} |",
                    date.date, date.days_difference, date.priority, date.description, date.document_name
                )?;
            }
            Ok(())
        })
    }

    fn format_key_date_stats(&self, stats: &KeyDateStats) -> String {
        render(|out| {
            writeln!(out, "## Key Date Statistics\n")?;
            writeln!(out, "| Metric | Value |")?;
            writeln!(out, "|--------|-------|")?;
            writeln!(out, "| Total dates | {} |", stats.total_dates)?;
            writeln!(out, "| Upcoming | {} |", stats.upcoming_dates)?;
            writeln!(out, "| Within a week | {} |", stats.this_week)?;
            writeln!(out, "| Within a month | {} |", stats.this_month)?;
            writeln!(out, "| Documents with dates | {} |", stats.documents_with_dates)
        })
    }

    fn format_fragments(&self, report: &FragmentReport) -> String {
        render(|out| {
            writeln!(out, "## Fragments of `{}`\n", report.document_id)?;
            writeln!(out, "**Strategy:** `{}`\n", report.strategy)?;
            writeln!(out, "| # | Page | Chunk | Chars | Preview |")?;
            writeln!(out, "|---|------|-------|-------|---------|")?;
            for (i, row) in report.fragments.iter().enumerate() {
                writeln!(
                    out,
                    "| {} | {} | {} | {} | {} |",
                    i + 1,
                    row.page,
                    row.chunk,
                    row.chars,
                    row.preview.replace('|', "\\|")
                )?;
            }
            Ok(())
        })
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mark = |ok: bool| if ok { "✅" } else { "❌" };
        render(|out| {
            writeln!(out, "## Status\n")?;
            writeln!(out, "### Database {}\n", mark(status.database_connected))?;
            writeln!(out, "- **URL:** `{}`\n", status.database_url)?;
            writeln!(out, "### Gemini API {}\n", mark(status.api_key_configured))?;
            writeln!(out, "- **Embedding:** {}", status.embedding_model)?;
            writeln!(out, "- **Answers:** {}", status.answer_model)?;
            writeln!(out, "- **Summaries:** {}\n", status.summary_model)?;
            writeln!(out, "### Public links {}", mark(status.storage_configured))
        })
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn answer() -> Answer {
        let mut source = Source::new(Some("d1".to_string()), Some("acta.pdf".to_string()));
        source.page = Some(3);
        source.url = Some("https://x/acta.pdf".to_string());
        source.snippets.push("El plazo\nvence el 15.".to_string());
        Answer {
            query: "¿Plazo?".to_string(),
            answer: "El 15 de marzo.".to_string(),
            sources: vec![source],
            fragments_used: 1,
            duration_ms: 12,
        }
    }

    #[test]
    fn test_text_answer() {
        let output = TextFormatter.format_answer(&answer());
        assert!(output.starts_with("El 15 de marzo.\n"));
        assert!(output.contains("1. acta.pdf (p. 3)"));
        assert!(output.contains("> El plazo vence el 15."));
    }

    #[test]
    fn test_markdown_answer_links_sources() {
        let output = MarkdownFormatter.format_answer(&answer());
        assert!(output.contains("- [acta.pdf](https://x/acta.pdf), p. 3"));
    }

    #[test]
    fn test_json_answer() {
        let output = JsonFormatter::new(false).format_answer(&answer());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["sources"][0]["name"], "acta.pdf");
        assert_eq!(value["fragments_used"], 1);
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(TextFormatter.format_documents(&[]), "No documents found.\n");
        let dates = KeyDateList {
            dates: vec![],
            total: 0,
            upcoming: true,
        };
        assert!(MarkdownFormatter.format_key_dates(&dates).contains("No key dates"));
    }

    #[test]
    fn test_truncated_summary_is_flagged() {
        let summary = Summary {
            document_id: "d1".to_string(),
            summary: "- uno\n- dos".to_string(),
            truncated: true,
            fragment_count: 40,
        };
        assert!(TextFormatter.format_summary(&summary).contains("truncated"));
    }
}
