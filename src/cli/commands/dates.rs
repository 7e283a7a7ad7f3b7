use anyhow::{Context, Result};
use clap::Subcommand;

use crate::app::App;
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::rag::key_dates::DEFAULT_LIMIT;

#[derive(Debug, Subcommand)]
pub enum DatesCommand {
    #[command(about = "List key dates, soonest first")]
    List {
        #[arg(long, short = 'u', help = "Only documents owned by this user")]
        user: Option<String>,
        #[arg(long, short = 'n', default_value_t = DEFAULT_LIMIT, help = "Maximum number of dates")]
        limit: usize,
        #[arg(long, short = 'a', help = "Include dates that have already passed")]
        all: bool,
    },
    #[command(about = "Show key date statistics")]
    Stats {
        #[arg(long, short = 'u', help = "Only documents owned by this user")]
        user: Option<String>,
    },
}

pub async fn handle_dates(cmd: DatesCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?.config;
    let formatter = get_formatter(format);

    let app = App::connect(config)
        .await
        .context("failed to connect to the document database")?;
    let service = app.key_dates();

    match cmd {
        DatesCommand::List { user, limit, all } => {
            if limit == 0 {
                anyhow::bail!("limit must be at least 1");
            }
            let dates = service.list(user.as_deref(), !all, limit).await?;
            print!("{}", formatter.format_key_dates(&dates));
        }
        DatesCommand::Stats { user } => {
            let stats = service.stats(user.as_deref()).await?;
            print!("{}", formatter.format_key_date_stats(&stats));
        }
    }

    Ok(())
}
