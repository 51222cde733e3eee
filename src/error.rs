use std::path::PathBuf;

use thiserror::Error;

/// Main error type for codedoc operations
#[derive(Error, Debug)]
pub enum CodedocError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("File {} is {size} bytes, above the {limit} byte limit", path.display())]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },
}

pub type Result<T> = std::result::Result<T, CodedocError>;
