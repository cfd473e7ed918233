//! Error types for the normalization engine.
//!
//! All errors implement the `std::error::Error` trait and carry structured
//! context. The engine's propagation policy is deliberately lenient: almost
//! every failure is local, meaning a bad file or row is skipped with a logged
//! warning and the run continues (see [`NormalizeError::is_local`]). Errors only
//! escape the pipeline when the run as a whole cannot proceed, e.g. the store
//! root is missing or an output file cannot be written.
//!
//! ## Error Categories
//!
//! - **Store Errors**: Problems reading the raw record store from disk
//! - **Parse Errors**: File content does not match the expected table or
//!   metadata shape
//! - **Missing Reference Errors**: A fact row references an event that is not
//!   present in the races dimension
//! - **Output Errors**: Failures writing the dimension/fact tables

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for normalization operations.
pub type Result<T, E = NormalizeError> = std::result::Result<T, E>;

/// Main error type for normalization operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NormalizeError {
    #[error("Store error: {path}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Invalid JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing {dimension} reference for key '{key}'")]
    MissingReference { dimension: &'static str, key: String },

    #[error("Output error: {path}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl NormalizeError {
    /// Returns whether this error is local to one file or row.
    ///
    /// Local errors are logged and skipped; the run always produces a
    /// best-effort output set from whatever input was parseable. Non-local
    /// errors abort the run.
    pub fn is_local(&self) -> bool {
        match self {
            NormalizeError::Parse { .. } => true,
            NormalizeError::Json { .. } => true,
            NormalizeError::MissingReference { .. } => true,
            NormalizeError::Store { .. } => false,
            NormalizeError::Output { .. } => false,
        }
    }

    /// Helper constructor for store read errors with path context.
    pub fn store_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NormalizeError::Store { path: path.into(), source }
    }

    /// Helper constructor for parse errors.
    pub fn parse_error(context: impl Into<String>, details: impl Into<String>) -> Self {
        NormalizeError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for missing dimension references.
    pub fn missing_reference(dimension: &'static str, key: impl Into<String>) -> Self {
        NormalizeError::MissingReference { dimension, key: key.into() }
    }

    /// Helper constructor for output write errors.
    pub fn output_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NormalizeError::Output { path: path.into(), source }
    }
}
