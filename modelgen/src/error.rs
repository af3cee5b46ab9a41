//! Error types for modelgen

use thiserror::Error;

/// Result type alias for modelgen operations
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Errors that can occur during code generation
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Failed to parse SQL schema: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid column pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Failed to introspect table `{table}`: {message}")]
    Introspection { table: String, message: String },

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Record `{0}` is already registered")]
    DuplicateRecord(String),

    #[error("Record `{0}` is not registered in this registry")]
    UnregisteredRecord(String),

    #[error("Failed to render `{record}`: {message}")]
    Render { record: String, message: String },
}

impl CodegenError {
    /// Whether this error only affects a single table or artifact.
    ///
    /// Configuration-time errors are fatal for the whole run.
    pub fn is_isolated(&self) -> bool {
        matches!(
            self,
            CodegenError::Introspection { .. }
                | CodegenError::TableNotFound(_)
                | CodegenError::Render { .. }
        )
    }
}

impl From<sqlparser::parser::ParserError> for CodegenError {
    fn from(err: sqlparser::parser::ParserError) -> Self {
        CodegenError::ParseError(err.to_string())
    }
}

impl From<config::ConfigError> for CodegenError {
    fn from(err: config::ConfigError) -> Self {
        CodegenError::ConfigError(err.to_string())
    }
}
