use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnchorError {
    #[error("Ledger submission failed: {0}")]
    Submission(String),

    #[error("Index query failed: {0}")]
    IndexQuery(String),

    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Source directory not found: {0}")]
    MissingSourceDir(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, AnchorError>;
