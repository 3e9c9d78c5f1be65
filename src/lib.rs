// Library interface for ragstore

pub mod client;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod mcp;
pub mod server;

// Re-export commonly used types
pub use client::RagClient;
pub use config::Config;
pub use embeddings::{NewEntry, SearchFilter, SearchResult, VectorStore};
pub use error::{RagError, Result};
