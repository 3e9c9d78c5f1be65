pub mod local;
pub mod service;
pub mod vectors;

use ragstore::error::{RagError, Result};

/// Runtime for commands that talk to the service
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| RagError::Config(format!("tokio runtime: {}", e)))
}
