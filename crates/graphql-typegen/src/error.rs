use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TypegenError>;

#[derive(Debug, Error)]
pub enum TypegenError {
    #[error("Configuration error: {0}")]
    Config(#[from] graphql_config::ConfigError),

    #[error("Extraction error: {0}")]
    Extract(#[from] graphql_extract::ExtractError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema loading error: {0}")]
    SchemaLoad(String),

    #[error("Schema parse error: {0}")]
    SchemaParse(String),

    #[error("Document loading error: {0}")]
    DocumentLoad(String),

    #[error("Compiler failed on {}: {message}", file.display())]
    Compiler { file: PathBuf, message: String },
}
