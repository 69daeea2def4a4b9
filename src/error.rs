//! Error types for mutation instrumentation

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while instrumenting a project
#[derive(Debug, Error)]
pub enum MutationError {
    /// Configuration document couldn't be read or parsed
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// A rule group pattern failed to compile
    #[error("Invalid pattern '{pattern}'\n  Regex error: {regex_error}")]
    InvalidPattern { pattern: String, regex_error: String },

    /// Target file doesn't exist
    #[error("File not found: {}", file.display())]
    FileNotFound { file: PathBuf },

    /// Failed to read source file
    #[error("Failed to read file '{}': {error}", file.display())]
    FileReadError { file: PathBuf, error: String },

    /// Failed to write instrumented file
    #[error("Failed to write file '{}': {error}", file.display())]
    WriteError { file: PathBuf, error: String },

    /// A pattern captured an operator that no group member declares
    #[error("Operator '{operator}' matched by a {kind} group has no member entry")]
    UnknownOperator { kind: String, operator: String },

    /// Rule group kind this engine cannot apply
    #[error("Unsupported mutation kind in group #{group}")]
    UnsupportedKind { group: usize },

    /// Failed to back up a source file
    #[error("Failed to back up '{}' to '{}': {error}", file.display(), backup.display())]
    BackupError {
        file: PathBuf,
        backup: PathBuf,
        error: String,
    },

    /// Failed to restore a source file from its backup
    #[error("Failed to restore '{}' from '{}': {error}", file.display(), backup.display())]
    RestoreError {
        file: PathBuf,
        backup: PathBuf,
        error: String,
    },
}

/// Result type for mutation operations
pub type Result<T> = std::result::Result<T, MutationError>;
