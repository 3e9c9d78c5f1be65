//! Line-delimited JSON-RPC tool server over stdio.

pub mod protocol;
pub mod server;

pub use server::McpServer;
