//! Command-line interface for docrag.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Grounded answers and summaries over your uploaded documents.
#[derive(Debug, Parser)]
#[command(name = "docrag")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Answer a question from the most similar document fragments
    Ask(commands::AskArgs),

    /// Summarize one document in five key points
    Summarize(commands::SummarizeArgs),

    /// Look up registered documents
    #[command(subcommand)]
    Documents(commands::DocumentsCommand),

    /// Key dates extracted from processed documents
    #[command(subcommand)]
    Dates(commands::DatesCommand),

    /// Show the fragments a summary would be built from
    Fragments(commands::FragmentsArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),

    /// Check database connectivity and model configuration
    Status,
}
