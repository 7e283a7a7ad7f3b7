use anyhow::{Context, Result};
use clap::Args;

use crate::app::App;
use crate::cli::output::{FragmentReport, FragmentRow, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::rag::LookupOutcome;
use crate::rag::context::order_fragments;
use crate::rag::metadata::{document_text, ordering_key};
use crate::utils::preview;

const PREVIEW_CHARS: usize = 120;

#[derive(Debug, Args)]
pub struct FragmentsArgs {
    #[arg(required = true, help = "Document identifier")]
    pub document_id: String,
}

pub async fn handle_fragments(args: FragmentsArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?.config;
    let formatter = get_formatter(format);

    let app = App::connect(config)
        .await
        .context("failed to connect to the document database")?;
    let lookup = app.fragment_lookup();

    if verbose {
        eprintln!("Lookup chain for {}:", args.document_id);
        for strategy in lookup.chain().strategies() {
            eprintln!("  {strategy}");
        }
        eprintln!();
    }

    let outcome = lookup.find(&args.document_id).await?;
    print!("{}", formatter.format_fragments(&report(&args.document_id, outcome)));

    Ok(())
}

/// Fragments in reading order with their ordering keys.
fn report(document_id: &str, outcome: LookupOutcome) -> FragmentReport {
    let mut fragments = outcome.fragments;
    order_fragments(&mut fragments);

    let rows = fragments
        .into_iter()
        .map(|fragment| {
            let (page, chunk) = ordering_key(&fragment);
            let text = document_text(&fragment);
            FragmentRow {
                id: fragment.id.clone(),
                page,
                chunk,
                chars: text.chars().count(),
                preview: preview(text, PREVIEW_CHARS),
                metadata: fragment.metadata.clone(),
            }
        })
        .collect();

    FragmentReport {
        document_id: document_id.to_string(),
        strategy: outcome.strategy.to_string(),
        fragments: rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::testing::fragment;
    use crate::services::LookupStrategy;
    use serde_json::json;

    #[test]
    fn test_report_is_in_reading_order() {
        let outcome = LookupOutcome {
            strategy: LookupStrategy::Function {
                name: "get_document_chunks".to_string(),
            },
            fragments: vec![
                fragment("segunda", json!({"page": 2, "chunk_index": 0})),
                fragment("", json!({"page": 1, "chunk_index": 1, "text": "desde metadatos"})),
                fragment("primera", json!({"page": 1, "chunk_index": 0})),
            ],
        };

        let report = report("d1", outcome);
        assert_eq!(report.strategy, "get_document_chunks(document_id)");
        let previews: Vec<&str> = report.fragments.iter().map(|r| r.preview.as_str()).collect();
        assert_eq!(previews, ["primera", "desde metadatos", "segunda"]);
        assert_eq!(report.fragments[1].chars, "desde metadatos".chars().count());
        assert_eq!((report.fragments[2].page, report.fragments[2].chunk), (2.0, 0.0));
    }
}
