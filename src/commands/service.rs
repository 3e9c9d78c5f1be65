use colored::Colorize;
use ragstore::config::Config;
use ragstore::error::{RagError, Result};
use ragstore::mcp::McpServer;
use ragstore::{server, VectorStore};
use std::sync::Arc;

pub fn cmd_serve(config: &Config) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| RagError::Config(format!("tokio runtime: {}", e)))?;

    eprintln!(
        "{} RAG service on {}",
        "Starting".green().bold(),
        config.bind_addr().cyan()
    );

    let store = Arc::new(VectorStore::new());
    rt.block_on(server::run(config, store))
}

pub fn cmd_mcp() -> Result<()> {
    let store = Arc::new(VectorStore::new());
    McpServer::new(store).run()
}
