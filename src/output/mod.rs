//! Output module for persisting crawl results
//!
//! This module handles:
//! - Writing extracted records to a JSON file
//! - Optionally appending them to a SQLite database

mod json;
mod sqlite;
mod traits;

pub use json::JsonOutput;
pub use sqlite::SqliteOutput;
pub use traits::{OutputError, OutputHandler, OutputResult};

use crate::config::OutputConfig;
use crate::crawler::CrawlResult;
use std::path::Path;

/// Builds the output handlers configured in `config`
///
/// The JSON handler is always present; SQLite only when a database path is set.
pub fn handlers_for(config: &OutputConfig) -> OutputResult<Vec<Box<dyn OutputHandler>>> {
    let mut handlers: Vec<Box<dyn OutputHandler>> = vec![Box::new(JsonOutput::new(&config.json_path))];

    if let Some(db_path) = &config.database_path {
        handlers.push(Box::new(SqliteOutput::new(Path::new(db_path))?));
    }

    Ok(handlers)
}

/// Writes `result` through every configured handler
///
/// # Returns
///
/// * `Ok(usize)` - Number of records written per handler
/// * `Err(OutputError)` - The first handler that failed
pub fn write_outputs(config: &OutputConfig, result: &CrawlResult) -> OutputResult<usize> {
    let mut written = 0;
    for mut handler in handlers_for(config)? {
        written = handler.write_result(result)?;
        tracing::debug!(handler = handler.name(), records = written, "Output handler finished");
    }
    Ok(written)
}
