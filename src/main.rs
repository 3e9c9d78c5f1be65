mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use ragstore::config::Config;
use ragstore::error::Result;
use tracing_subscriber::EnvFilter;

use commands::local::{cmd_embed, cmd_extract, cmd_extract_sop, sop_fallback};
use commands::service::{cmd_mcp, cmd_serve};
use commands::vectors::{cmd_add, cmd_clear, cmd_delete, cmd_get, cmd_search, cmd_stats};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries command output and the stdio protocol.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "ragstore=debug,tower_http=debug"
    } else {
        "ragstore=info,tower_http=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        // Local commands need no configuration
        Commands::Embed { text, full } => cmd_embed(&text, full),
        Commands::Extract {
            file,
            json,
            sop,
            title,
            resolution,
            symptoms,
            root_cause,
            category,
        } => {
            if sop {
                let fallback = sop_fallback(
                    title.as_deref(),
                    resolution.as_deref(),
                    symptoms.as_deref(),
                    root_cause.as_deref(),
                    category.as_deref(),
                )?;
                cmd_extract_sop(file.as_deref(), json, &fallback)
            } else {
                cmd_extract(file.as_deref(), json)
            }
        }
        Commands::Mcp => cmd_mcp(),
        Commands::Serve { host, port } => {
            let config = Config::load(host.as_deref(), port, cli.url.as_deref())?;
            cmd_serve(&config)
        }
        // Client commands only need the service URL
        command => {
            let url = Config::client_url(cli.url.as_deref())?;
            run_client(command, &url)
        }
    }
}

fn run_client(command: Commands, url: &str) -> Result<()> {
    match command {
        Commands::Add {
            content,
            record_type,
            source_id,
            id,
            meta,
        } => cmd_add(url, &content, &record_type, &source_id, id.as_deref(), &meta),
        Commands::Search {
            query,
            top_k,
            record_type,
            source_id,
        } => cmd_search(
            url,
            &query,
            top_k,
            record_type.as_deref(),
            source_id.as_deref(),
        ),
        Commands::Get { id } => cmd_get(url, &id),
        Commands::Delete { id } => cmd_delete(url, &id),
        Commands::Clear { yes } => cmd_clear(url, yes),
        Commands::Stats => cmd_stats(url),
        Commands::Serve { .. }
        | Commands::Mcp
        | Commands::Embed { .. }
        | Commands::Extract { .. } => Ok(()),
    }
}
