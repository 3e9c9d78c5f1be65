use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, RagError>;
