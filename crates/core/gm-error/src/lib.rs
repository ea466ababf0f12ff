//! Error types for gdpmap.
//!
//! This crate provides:
//! - [`GmError`] - Top-level error enum for the whole pipeline
//! - [`TableError`] - Fatal configuration errors raised while loading
//!   delimited input tables
//!
//! Unmatched country codes and missing per-year values are *not* errors:
//! they are reported through the normal return values of the reconciliation
//! and extraction stages.

use thiserror::Error;

/// Top-level error type for gdpmap.
#[derive(Error, Debug)]
pub enum GmError {
    /// Table loading errors (file access, header lookup, parsing)
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Errors writing map layers to a sink
    #[error("Render error: {0}")]
    Render(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised while loading a delimited table.
///
/// All of these are fatal configuration errors: they propagate to the caller
/// immediately and nothing is retried.
#[derive(Error, Debug)]
pub enum TableError {
    /// Input file not found
    #[error("File not found: {0}")]
    NotFound(String),

    /// I/O error during read
    #[error("I/O error: {0}")]
    Io(String),

    /// A configured column name is absent from the header row
    #[error("Column '{column}' not found in header: {header:?}")]
    MissingColumn {
        column: String,
        header: Vec<String>,
    },

    /// Malformed delimited content
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type alias using GmError.
pub type Result<T> = std::result::Result<T, GmError>;
