//! SQLite output
//!
//! Every run gets a row in `runs`; its records go to `products`. Prices are
//! stored as decimal text so no precision is lost.

use crate::crawler::CrawlResult;
use crate::output::traits::{OutputHandler, OutputResult};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQL schema for the products database
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    outcome TEXT NOT NULL,
    records INTEGER NOT NULL,
    failures INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    price TEXT NOT NULL,
    description TEXT NOT NULL,
    image_url TEXT NOT NULL,
    category TEXT NOT NULL,
    brand TEXT NOT NULL,
    source_url TEXT NOT NULL,
    scraped_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_products_run ON products(run_id);
CREATE INDEX IF NOT EXISTS idx_products_source ON products(source_url);
"#;

/// Appends run results to a SQLite database
pub struct SqliteOutput {
    conn: Connection,
}

impl SqliteOutput {
    /// Opens (or creates) the database at `path`
    pub fn new(path: &Path) -> OutputResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> OutputResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Number of stored products across all runs
    pub fn count_products(&self) -> OutputResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl OutputHandler for SqliteOutput {
    fn write_result(&mut self, result: &CrawlResult) -> OutputResult<usize> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO runs (started_at, finished_at, outcome, records, failures)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                result.started_at.to_rfc3339(),
                result.finished_at.to_rfc3339(),
                result.outcome.label(),
                result.records.len() as i64,
                result.failures.len() as i64,
            ],
        )?;
        let run_id = tx.last_insert_rowid();
        let scraped_at = result.finished_at.to_rfc3339();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO products
                 (run_id, position, name, price, description, image_url, category, brand, source_url, scraped_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;

            for (position, record) in result.records.iter().enumerate() {
                stmt.execute(params![
                    run_id,
                    position as i64,
                    record.name,
                    record.price.to_string(),
                    record.description,
                    record.image_url,
                    record.category,
                    record.brand,
                    record.source_url,
                    scraped_at,
                ])?;
            }
        }

        tx.commit()?;

        tracing::info!(run_id, records = result.records.len(), "Wrote SQLite output");
        Ok(result.records.len())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
