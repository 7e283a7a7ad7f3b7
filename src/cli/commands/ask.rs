use anyhow::{Context, Result};
use clap::Args;

use crate::app::App;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(required = true, help = "Question to answer")]
    pub query: String,

    #[arg(long, short = 't', help = "Minimum similarity for a fragment (0.0-1.0)")]
    pub threshold: Option<f32>,

    #[arg(long, short = 'n', help = "Maximum number of fragments to retrieve")]
    pub limit: Option<u32>,
}

pub async fn handle_ask(args: AskArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("question cannot be empty");
    }

    if let Some(threshold) = args.threshold
        && !(0.0..=1.0).contains(&threshold)
    {
        anyhow::bail!("threshold must be between 0.0 and 1.0");
    }
    if args.limit == Some(0) {
        anyhow::bail!("limit must be at least 1");
    }

    let config = Config::load()?.config;
    let formatter = get_formatter(format);

    let app = App::connect(config)
        .await
        .context("failed to connect to the document database")?;

    let mut pipeline = app.query_pipeline()?;
    if let Some(threshold) = args.threshold {
        pipeline = pipeline.with_threshold(threshold);
    }
    if let Some(limit) = args.limit {
        pipeline = pipeline.with_limit(limit);
    }

    if verbose {
        eprintln!("Question: \"{query}\"");
        eprintln!(
            "  Threshold: {}",
            args.threshold.unwrap_or(app.config().rag.match_threshold)
        );
        eprintln!(
            "  Limit: {}",
            args.limit.unwrap_or(app.config().rag.match_count)
        );
        eprintln!();
    }

    let answer = pipeline.answer(query).await?;
    print!("{}", formatter.format_answer(&answer));

    Ok(())
}
