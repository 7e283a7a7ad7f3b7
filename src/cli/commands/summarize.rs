use anyhow::{Context, Result};
use clap::Args;

use crate::app::App;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Args)]
pub struct SummarizeArgs {
    #[arg(required = true, help = "Document identifier")]
    pub document_id: String,

    #[arg(long, short = 'u', help = "Only summarize if this user owns the document")]
    pub user: Option<String>,
}

pub async fn handle_summarize(args: SummarizeArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?.config;
    let formatter = get_formatter(format);

    let app = App::connect(config)
        .await
        .context("failed to connect to the document database")?;
    let pipeline = app.summary_pipeline()?;

    if verbose {
        eprintln!("Summarizing document {}", args.document_id);
        if let Some(ref user) = args.user {
            eprintln!("  As user: {user}");
        }
        eprintln!();
    }

    let summary = pipeline
        .summarize(&args.document_id, args.user.as_deref())
        .await?;
    print!("{}", formatter.format_summary(&summary));

    Ok(())
}
