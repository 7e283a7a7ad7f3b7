use anyhow::{Context, Result};
use clap::Subcommand;

use crate::app::App;
use crate::cli::output::get_formatter;
use crate::models::{Config, DocumentFilter, DocumentSort, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum DocumentsCommand {
    #[command(about = "List documents")]
    List {
        #[arg(long, short = 'u', help = "Only documents owned by this user")]
        user: Option<String>,
        #[arg(long, short = 's', help = "Only documents with this processing status")]
        status: Option<String>,
        #[arg(long, help = "Case-insensitive search in file names")]
        search: Option<String>,
        #[arg(
            long,
            default_value_t = DocumentSort::UploadedDesc,
            help = "Sort order: uploaded_desc, uploaded_asc, name_asc, name_desc"
        )]
        sort: DocumentSort,
    },
    #[command(about = "Show one document")]
    Get {
        #[arg(help = "Document identifier")]
        id: String,
    },
    #[command(about = "Print the public link to a document's file")]
    Url {
        #[arg(help = "Document identifier")]
        id: String,
    },
}

pub async fn handle_documents(
    cmd: DocumentsCommand,
    format: OutputFormat,
    _verbose: bool,
) -> Result<()> {
    let config = Config::load()?.config;
    let formatter = get_formatter(format);

    let app = App::connect(config)
        .await
        .context("failed to connect to the document database")?;
    let documents = app.documents();

    match cmd {
        DocumentsCommand::List {
            user,
            status,
            search,
            sort,
        } => {
            let filter = DocumentFilter {
                owner: user,
                status,
                name_contains: search.filter(|s| !s.trim().is_empty()),
                sort,
            };
            let records = documents.list(&filter).await?;
            print!("{}", formatter.format_documents(&records));
        }
        DocumentsCommand::Get { id } => {
            let record = documents.get(&id).await?;
            print!("{}", formatter.format_document(&record));
        }
        DocumentsCommand::Url { id } => {
            let url = documents.public_url_for(&id).await?;
            print!("{}", formatter.format_message(&url));
        }
    }

    Ok(())
}
