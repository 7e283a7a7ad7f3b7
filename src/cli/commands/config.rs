use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::{Formatter, get_formatter};
use crate::models::{Config, OutputFormat, ResolvedConfig};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Initialize configuration file")]
    Init {
        #[arg(
            long,
            short = 'g',
            help = "Create global config instead of project config"
        )]
        global: bool,
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show current configuration")]
    Show {
        #[arg(long, help = "Show source of each configuration value")]
        source: bool,
    },
    #[command(about = "Show configuration file paths")]
    Path {
        #[arg(long, help = "Show all possible config paths")]
        all: bool,
    },
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Init { global, force } => handle_init(global, force, formatter.as_ref()),
        ConfigCommand::Show { source } => handle_show(source, format),
        ConfigCommand::Path { all } => handle_path(all),
    }
}

fn handle_init(global: bool, force: bool, formatter: &dyn Formatter) -> Result<()> {
    let (config_path, scope) = if global {
        let path = Config::global_path()
            .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;
        (path, "Global")
    } else {
        let dir = Config::project_config_dir()
            .ok_or_else(|| anyhow::anyhow!("could not determine project directory"))?;
        (dir.join("config.toml"), "Project")
    };

    if config_path.exists() && !force {
        anyhow::bail!(
            "{scope} config already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    let path = if global {
        Config::init_global().context("failed to create global config")?
    } else {
        Config::init_project().context("failed to create project config")?
    };

    print!(
        "{}",
        formatter.format_message(&format!("Created {} config at: {}", scope.to_lowercase(), path.display()))
    );

    Ok(())
}

fn handle_show(show_source: bool, format: OutputFormat) -> Result<()> {
    let resolved = Config::load()?;

    if format == OutputFormat::Json {
        let mut config = serde_json::to_value(&resolved.config)?;
        if let Some(key) = config.pointer_mut("/gemini/api_key") {
            *key = serde_json::Value::String("********".to_string());
        }

        let output = if show_source {
            serde_json::json!({
                "config": config,
                "sources": resolved.sources,
                "project_path": resolved.project_path,
                "global_path": resolved.global_path,
            })
        } else {
            config
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(ref path) = resolved.project_path {
        println!("# Project config: {}", path.display());
    }
    if let Some(ref path) = resolved.global_path {
        println!("# Global config: {}", path.display());
    }
    println!();

    print_resolved_config(&resolved, show_source);

    Ok(())
}

fn print_resolved_config(resolved: &ResolvedConfig, show_source: bool) {
    let config = &resolved.config;
    let line = |key: &str, value: String| {
        let name = key.rsplit('.').next().unwrap_or(key);
        if show_source {
            println!("{name} = {value}  # {}", resolved.source_of(key));
        } else {
            println!("{name} = {value}");
        }
    };
    let quoted = |s: &str| format!("\"{s}\"");

    println!("[gemini]");
    line("gemini.api_base", quoted(&config.gemini.api_base));
    if config.gemini.api_key.is_some() {
        line("gemini.api_key", quoted("********"));
    }
    line("gemini.embedding_model", quoted(&config.gemini.embedding_model));
    line("gemini.answer_model", quoted(&config.gemini.answer_model));
    line("gemini.summary_model", quoted(&config.gemini.summary_model));
    line(
        "gemini.embedding_timeout_secs",
        config.gemini.embedding_timeout_secs.to_string(),
    );
    line(
        "gemini.generation_timeout_secs",
        config.gemini.generation_timeout_secs.to_string(),
    );
    println!();

    println!("[database]");
    line("database.url", quoted(&config.database.redacted_url()));
    line("database.pool_max", config.database.pool_max.to_string());
    line(
        "database.acquire_timeout_secs",
        config.database.acquire_timeout_secs.to_string(),
    );
    line(
        "database.statement_timeout_secs",
        config.database.statement_timeout_secs.to_string(),
    );
    line("database.documents_table", quoted(&config.database.documents_table));
    line("database.match_function", quoted(&config.database.match_function));
    line("database.chunks_function", quoted(&config.database.chunks_function));
    line(
        "database.chunks_function_arg_type",
        quoted(&config.database.chunks_function_arg_type),
    );
    line("database.fragment_table", quoted(&config.database.fragment_table));
    line(
        "database.fallback_tables",
        format!("{:?}", config.database.fallback_tables),
    );
    line(
        "database.document_id_keys",
        format!("{:?}", config.database.document_id_keys),
    );
    println!();

    println!("[storage]");
    if let Some(ref url) = config.storage.public_base_url {
        line("storage.public_base_url", quoted(url));
    }
    line("storage.bucket", quoted(&config.storage.bucket));
    println!();

    println!("[rag]");
    line("rag.match_threshold", config.rag.match_threshold.to_string());
    line("rag.match_count", config.rag.match_count.to_string());
    println!();

    println!("[summary]");
    line("summary.max_chars", config.summary.max_chars.to_string());
    println!();

    println!("[output]");
    line(
        "output.default_format",
        quoted(&config.output.default_format.to_string()),
    );
    println!();

    println!("[log]");
    line("log.level", quoted(&config.log.level));
}

fn handle_path(show_all: bool) -> Result<()> {
    let project_path = Config::find_project_config();
    let global_path = Config::global_path();

    println!("Configuration paths:");
    println!();

    if let Some(ref path) = project_path {
        println!("Project config (active): {}", path.display());
    } else if show_all && let Some(dir) = Config::project_config_dir() {
        println!(
            "Project config (would be): {}",
            dir.join("config.toml").display()
        );
    }

    if let Some(ref path) = global_path {
        if path.is_file() {
            println!("Global config (active): {}", path.display());
        } else if show_all {
            println!("Global config (would be): {}", path.display());
        }
    }

    if show_all && let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        if env_path.exists() {
            println!(".env file (active): {}", env_path.display());
        } else {
            println!(".env file (would be): {}", env_path.display());
        }
    }

    Ok(())
}
