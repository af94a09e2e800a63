//! Shelf-Scout: a polite product-page scraper
//!
//! This crate fetches product pages from a single e-commerce site and turns
//! each one into a normalized [`ProductRecord`], respecting the site's
//! robots.txt, pacing its requests, and falling back to per-field defaults
//! whenever the markup does not yield a value.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod policy;

use thiserror::Error;

/// Main error type for Shelf-Scout operations
///
/// Per-page problems never surface here; they are recorded in the
/// [`crawler::CrawlResult`] failure log instead.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid extraction rule for '{field}': {message}")]
    InvalidRule { field: String, message: String },
}

/// Result type alias for Shelf-Scout operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlFailure, CrawlResult, FailureKind, RunOutcome};
pub use extract::{ExtractionRule, Hypothesis, ProductRecord};
pub use policy::CrawlPolicy;
