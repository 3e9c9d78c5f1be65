use crate::error::{RagError, Result};

/// Dimensionality of every vector held by a store
pub const EMBEDDING_DIM: usize = 384;
/// Scores at or below this value are treated as noise and never returned
pub const MIN_SIMILARITY: f64 = 0.3;
/// Result count used when a search does not specify `topK`
pub const DEFAULT_TOP_K: usize = 5;
/// Confidence used when generated text yields none (or zero)
pub const DEFAULT_CONFIDENCE: f64 = 0.7;
/// Resolutions above this confidence may be applied without review
pub const AUTO_RESOLVE_CONFIDENCE: f64 = 0.85;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3002;

#[derive(Debug, Clone)]
pub struct Config {
    /// Interface the HTTP service binds to
    pub host: String,
    /// Port the HTTP service listens on
    pub port: u16,
    /// Base URL the client talks to
    pub url: String,
}

impl Config {
    /// Resolve configuration from the environment, with CLI overrides taking precedence.
    pub fn load(host: Option<&str>, port: Option<u16>, url: Option<&str>) -> Result<Self> {
        let host = match host {
            Some(h) => h.to_string(),
            None => std::env::var("RAGSTORE_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
        };

        let port = match port {
            Some(p) => p,
            None => match std::env::var("RAGSTORE_PORT") {
                Ok(raw) => parse_port(&raw)?,
                Err(_) => DEFAULT_PORT,
            },
        };

        let url = match url {
            Some(u) => u.to_string(),
            None => std::env::var("RAGSTORE_URL")
                .unwrap_or_else(|_| format!("http://{}:{}", DEFAULT_HOST, port)),
        };

        Ok(Config {
            host,
            port,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL for client commands. `RAGSTORE_PORT` is only consulted when
    /// neither `url` nor `RAGSTORE_URL` is set.
    pub fn client_url(url: Option<&str>) -> Result<String> {
        let url = match url {
            Some(u) => u.to_string(),
            None => match std::env::var("RAGSTORE_URL") {
                Ok(u) => u,
                Err(_) => {
                    let port = match std::env::var("RAGSTORE_PORT") {
                        Ok(raw) => parse_port(&raw)?,
                        Err(_) => DEFAULT_PORT,
                    };
                    format!("http://{}:{}", DEFAULT_HOST, port)
                }
            },
        };
        Ok(url.trim_end_matches('/').to_string())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_port(raw: &str) -> Result<u16> {
    raw.trim()
        .parse::<u16>()
        .map_err(|_| RagError::Config(format!("Invalid RAGSTORE_PORT: {}", raw)))
}
