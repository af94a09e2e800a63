//! Extraction rules and field defaults
//!
//! A field is located by an ordered list of [`Hypothesis`] values. The
//! built-in lists below cover the product page layouts seen so far; each one
//! can be replaced per field from the `[fields.*]` config tables.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The product fields extracted from every page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Price,
    Description,
    Image,
    Category,
    Brand,
}

impl Field {
    /// Every field, in record order
    pub const ALL: [Field; 6] = [
        Field::Name,
        Field::Price,
        Field::Description,
        Field::Image,
        Field::Category,
        Field::Brand,
    ];

    /// Returns the config/log name of this field
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Price => "price",
            Field::Description => "description",
            Field::Image => "image",
            Field::Category => "category",
            Field::Brand => "brand",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate location for a field value
///
/// `query` is handed to the document unchanged. Without an `attribute` the
/// text content of the first matching node is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Hypothesis {
    /// Reads the text of the first node matching `query`
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            attribute: None,
        }
    }

    /// Reads `attribute` from the first node matching `query`
    pub fn attribute(query: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            attribute: Some(attribute.into()),
        }
    }
}

impl fmt::Display for Hypothesis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attr) => write!(f, "{}@{}", self.query, attr),
            None => f.write_str(&self.query),
        }
    }
}

/// Ordered hypotheses for one field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionRule {
    hypotheses: Vec<Hypothesis>,
}

impl ExtractionRule {
    pub fn new(hypotheses: Vec<Hypothesis>) -> Self {
        Self { hypotheses }
    }

    pub fn hypotheses(&self) -> &[Hypothesis] {
        &self.hypotheses
    }

    pub fn is_empty(&self) -> bool {
        self.hypotheses.is_empty()
    }
}

impl FromIterator<Hypothesis> for ExtractionRule {
    fn from_iter<I: IntoIterator<Item = Hypothesis>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// The rule set for every field, shared read-only across a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRules {
    name: ExtractionRule,
    price: ExtractionRule,
    description: ExtractionRule,
    image: ExtractionRule,
    category: ExtractionRule,
    brand: ExtractionRule,
}

impl ExtractionRules {
    pub fn get(&self, field: Field) -> &ExtractionRule {
        match field {
            Field::Name => &self.name,
            Field::Price => &self.price,
            Field::Description => &self.description,
            Field::Image => &self.image,
            Field::Category => &self.category,
            Field::Brand => &self.brand,
        }
    }

    pub fn set(&mut self, field: Field, rule: ExtractionRule) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Price => &mut self.price,
            Field::Description => &mut self.description,
            Field::Image => &mut self.image,
            Field::Category => &mut self.category,
            Field::Brand => &mut self.brand,
        };
        *slot = rule;
    }

    /// Returns a copy with `field` replaced by `rule`
    pub fn with(mut self, field: Field, rule: ExtractionRule) -> Self {
        self.set(field, rule);
        self
    }
}

impl Default for ExtractionRules {
    fn default() -> Self {
        use Hypothesis as H;

        Self {
            name: ExtractionRule::new(vec![
                H::text(r#"h1[data-automation-id="product-title"]"#),
                H::text("h1.prod-ProductTitle"),
                H::text("h1#main-title"),
                H::text(r#"[itemprop="name"]"#),
                H::text("h1"),
            ]),
            price: ExtractionRule::new(vec![
                H::text(r#"[data-automation-id="product-price"]"#),
                H::text(".price-current"),
                H::text(".price-display"),
                H::attribute(r#"[itemprop="price"]"#, "content"),
                H::text(r#"[itemprop="price"]"#),
            ]),
            description: ExtractionRule::new(vec![
                H::text(r#"[data-automation-id="product-description"]"#),
                H::text(".about-desc"),
                H::text(".product-description"),
                H::text(r#"[itemprop="description"]"#),
                H::attribute(r#"meta[name="description"]"#, "content"),
            ]),
            // Lazy-loaded images keep the real URL in data-src
            image: ExtractionRule::new(vec![
                H::attribute(r#"img[data-automation-id="product-image"]"#, "src"),
                H::attribute(r#"img[data-automation-id="product-image"]"#, "data-src"),
                H::attribute(".prod-hero-image img", "src"),
                H::attribute(".prod-hero-image img", "data-src"),
                H::attribute(".product-image img", "src"),
                H::attribute(".product-image img", "data-src"),
                H::attribute(r#"img[itemprop="image"]"#, "src"),
                H::attribute(r#"meta[property="og:image"]"#, "content"),
            ]),
            // The last breadcrumb is the product itself; the one before it is the category.
            // The anchor form only matches sibling anchors; `li`-wrapped trails go through the first rule.
            category: ExtractionRule::new(vec![
                H::text(".breadcrumb li:nth-last-child(2)"),
                H::text(".breadcrumb a:nth-last-of-type(2)"),
                H::text(r#"[itemprop="category"]"#),
            ]),
            brand: ExtractionRule::new(vec![
                H::text(r#"[data-automation-id="product-brand"]"#),
                H::text(".brand-name"),
                H::text(r#"[itemprop="brand"] [itemprop="name"]"#),
                H::text(r#"[itemprop="brand"]"#),
            ]),
        }
    }
}

/// Value used for each field when its hypotheses are exhausted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefaults {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub image_url: String,
    pub category: String,
    pub brand: String,
}

impl Default for FieldDefaults {
    fn default() -> Self {
        Self {
            name: "Unknown Product".to_string(),
            price: Decimal::ZERO,
            description: "No description available".to_string(),
            image_url: String::new(),
            category: "Unknown Category".to_string(),
            brand: "Unknown Brand".to_string(),
        }
    }
}
