//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers and the
//! errors they report.

use crate::crawler::CrawlResult;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize records: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for output handlers
///
/// A handler persists the records of one finished run. Records are written
/// in the order they appear in the result.
pub trait OutputHandler {
    /// Writes the records of `result`
    ///
    /// # Returns
    ///
    /// The number of records written
    fn write_result(&mut self, result: &CrawlResult) -> OutputResult<usize>;

    /// Short name used in log events
    fn name(&self) -> &'static str;
}
