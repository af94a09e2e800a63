//! Product record assembly
//!
//! Runs the field extractor once per field and fills every miss from the
//! configured defaults, so a record is always complete.

use crate::extract::document::Document;
use crate::extract::extractor::{Extraction, FieldExtractor};
use crate::extract::rules::{ExtractionRules, Field, FieldDefaults};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A normalized product extracted from one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    /// Absolute URL, or empty when no image was found
    pub image_url: String,
    pub category: String,
    pub brand: String,
    pub source_url: String,
}

/// Builds [`ProductRecord`]s from parsed pages
#[derive(Debug, Clone)]
pub struct ProductAssembler {
    extractor: FieldExtractor,
    rules: Arc<ExtractionRules>,
    defaults: FieldDefaults,
}

impl ProductAssembler {
    pub fn new(extractor: FieldExtractor, rules: Arc<ExtractionRules>, defaults: FieldDefaults) -> Self {
        Self {
            extractor,
            rules,
            defaults,
        }
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    pub fn defaults(&self) -> &FieldDefaults {
        &self.defaults
    }

    /// Assembles the record for one page; never fails
    pub fn assemble<D: Document + ?Sized>(&self, document: &D, source_url: &str) -> ProductRecord {
        let extractor = &self.extractor;
        let rules = &self.rules;
        let defaults = &self.defaults;

        let name = extractor.extract(document, rules.get(Field::Name));
        let price = extractor.extract_price(document, rules.get(Field::Price));
        let description = extractor.extract_description(document, rules.get(Field::Description));
        let image_url = extractor.extract_image(document, rules.get(Field::Image));
        let category = extractor.extract(document, rules.get(Field::Category));
        let brand = extractor.extract(document, rules.get(Field::Brand));

        ProductRecord {
            name: resolve(Field::Name, name, &defaults.name, source_url),
            price: resolve(Field::Price, price, &defaults.price, source_url),
            description: resolve(Field::Description, description, &defaults.description, source_url),
            image_url: resolve(Field::Image, image_url, &defaults.image_url, source_url),
            category: resolve(Field::Category, category, &defaults.category, source_url),
            brand: resolve(Field::Brand, brand, &defaults.brand, source_url),
            source_url: source_url.to_string(),
        }
    }
}

/// Applies the default for an exhausted field and records the fallback
fn resolve<T: Default + Clone>(
    field: Field,
    extraction: Extraction<T>,
    default: &T,
    source_url: &str,
) -> T {
    if !extraction.matched {
        tracing::debug!(url = source_url, %field, "Extraction fallbacks exhausted, using default");
    }
    extraction.or(default.clone())
}
