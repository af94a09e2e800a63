//! Resilient product field extraction
//!
//! This module contains:
//! - Extraction rules (ordered hypotheses per field) and field defaults
//! - The parsed-document seam over `scraper`
//! - The fallback-chain field extractor
//! - The product assembler that always yields a complete record

mod assembler;
mod document;
mod extractor;
mod rules;

pub use assembler::{ProductAssembler, ProductRecord};
pub use document::{Document, HtmlDocument};
pub use extractor::{evaluate, parse_price, Extraction, FieldExtractor, DESCRIPTION_MAX_CHARS};
pub use rules::{ExtractionRule, ExtractionRules, Field, FieldDefaults, Hypothesis};
