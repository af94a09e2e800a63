//! JSON file output
//!
//! Writes the extracted records as one pretty-printed JSON array.

use crate::crawler::CrawlResult;
use crate::extract::ProductRecord;
use crate::output::traits::{OutputHandler, OutputResult};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes records to a JSON file, replacing any previous content
#[derive(Debug, Clone)]
pub struct JsonOutput {
    path: PathBuf,
}

impl JsonOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `records` as a JSON array
    ///
    /// Missing parent directories are created.
    pub fn write_records(&self, records: &[ProductRecord]) -> OutputResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writeln!(writer)?;
        writer.flush()?;

        Ok(())
    }
}

impl OutputHandler for JsonOutput {
    fn write_result(&mut self, result: &CrawlResult) -> OutputResult<usize> {
        self.write_records(&result.records)?;
        tracing::info!(
            path = %self.path.display(),
            records = result.records.len(),
            "Wrote JSON output"
        );
        Ok(result.records.len())
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn sample_record() -> ProductRecord {
        ProductRecord {
            name: "Whole Milk".to_string(),
            price: Decimal::from_str("4.29").unwrap(),
            description: "One gallon".to_string(),
            image_url: "https://shop.example.com/img/milk.jpg".to_string(),
            category: "Dairy".to_string(),
            brand: "Great Value".to_string(),
            source_url: "https://shop.example.com/ip/1".to_string(),
        }
    }

    #[test]
    fn test_write_records_camel_case() {
        let dir = TempDir::new().unwrap();
        let output = JsonOutput::new(dir.path().join("products.json"));

        output.write_records(&[sample_record()]).unwrap();

        let content = fs::read_to_string(output.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        let first = &value.as_array().unwrap()[0];

        assert_eq!(first["name"], "Whole Milk");
        assert_eq!(first["price"].as_f64(), Some(4.29));
        assert_eq!(first["imageUrl"], "https://shop.example.com/img/milk.jpg");
        assert_eq!(first["sourceUrl"], "https://shop.example.com/ip/1");
        assert!(first.get("image_url").is_none());
    }

    #[test]
    fn test_write_empty_array() {
        let dir = TempDir::new().unwrap();
        let output = JsonOutput::new(dir.path().join("empty.json"));

        output.write_records(&[]).unwrap();

        let content = fs::read_to_string(output.path()).unwrap();
        assert_eq!(content.trim(), "[]");
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let output = JsonOutput::new(dir.path().join("out/nested/products.json"));

        output.write_records(&[sample_record()]).unwrap();
        assert!(output.path().exists());
    }
}
