use anyhow::Result;

use crate::app::App;
use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat};

pub async fn handle_status(format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?.config;
    let formatter = get_formatter(format);

    let database_url = config.database.redacted_url();
    let api_key_configured = config
        .gemini
        .api_key
        .as_deref()
        .is_some_and(|key| !key.trim().is_empty());
    let storage_configured = config.storage.public_base_url.is_some();
    let gemini = config.gemini.clone();

    let database_connected = match App::connect(config).await {
        Ok(app) => app.store().health_check().await.unwrap_or(false),
        Err(e) => {
            if verbose {
                eprintln!("Database error: {e}");
            }
            false
        }
    };

    let status = StatusInfo {
        database_url,
        database_connected,
        api_key_configured,
        embedding_model: gemini.embedding_model,
        answer_model: gemini.answer_model,
        summary_model: gemini.summary_model,
        storage_configured,
    };

    print!("{}", formatter.format_status(&status));

    if !database_connected || !api_key_configured || !storage_configured {
        eprintln!();
        if !database_connected {
            eprintln!("Warning: PostgreSQL not accessible. Check DATABASE_URL or [database].url.");
        }
        if !api_key_configured {
            eprintln!("Hint: set GEMINI_API_KEY to enable ask and summarize.");
        }
        if !storage_configured {
            eprintln!("Hint: set SUPABASE_URL to include public links in sources.");
        }
    }

    Ok(())
}
