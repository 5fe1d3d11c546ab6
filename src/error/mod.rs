use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvenaError {
    #[error("File '{0}' not found")]
    FileNotFound(String),

    #[error("Invalid audit document: {0}")]
    InvalidDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProvenaError>;
