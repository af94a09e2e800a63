//! Fallback-chain field extractor
//!
//! Every field is read by the same evaluator: hypotheses are tried in order
//! and the first one whose value is non-empty after trimming, and accepted by
//! the field's validator, wins. Later hypotheses are never evaluated.

use crate::extract::document::Document;
use crate::extract::rules::ExtractionRule;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;
use url::Url;

/// Maximum length of an extracted description, in characters
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// First monetary-looking substring: optional currency symbol, digits with
/// optional thousands separators, optional decimal fraction
static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[$€£¥]\s*)?(\d{1,3}(?:,\d{3})+|\d+)(?:\.(\d+))?")
        .expect("price pattern is a valid regex")
});

/// Result of running one rule against a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction<T = String> {
    pub value: T,
    pub matched: bool,
}

impl<T: Default> Extraction<T> {
    fn hit(value: T) -> Self {
        Self {
            value,
            matched: true,
        }
    }

    fn miss() -> Self {
        Self {
            value: T::default(),
            matched: false,
        }
    }

    /// Returns the extracted value, or `default` when nothing matched
    pub fn or(self, default: T) -> T {
        if self.matched {
            self.value
        } else {
            default
        }
    }
}

/// Evaluates extraction rules against parsed documents
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    base_url: Url,
}

impl FieldExtractor {
    /// Creates an extractor resolving relative URLs against `base_url`
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Extracts a plain text field
    pub fn extract<D: Document + ?Sized>(&self, document: &D, rule: &ExtractionRule) -> Extraction {
        evaluate(document, rule, |value| Some(value.to_string()))
    }

    /// Extracts a price, skipping hypotheses whose text holds no amount
    pub fn extract_price<D: Document + ?Sized>(
        &self,
        document: &D,
        rule: &ExtractionRule,
    ) -> Extraction<Decimal> {
        evaluate(document, rule, parse_price)
    }

    /// Extracts a description truncated to [`DESCRIPTION_MAX_CHARS`]
    pub fn extract_description<D: Document + ?Sized>(
        &self,
        document: &D,
        rule: &ExtractionRule,
    ) -> Extraction {
        evaluate(document, rule, |value| Some(truncate_chars(value, DESCRIPTION_MAX_CHARS)))
    }

    /// Extracts an image URL, resolving relative paths against the base URL
    pub fn extract_image<D: Document + ?Sized>(
        &self,
        document: &D,
        rule: &ExtractionRule,
    ) -> Extraction {
        evaluate(document, rule, |value| resolve_url(&self.base_url, value))
    }
}

/// Runs `rule` against `document`, short-circuiting on the first accepted value
///
/// `accept` turns a trimmed, whitespace-collapsed, non-empty raw value into
/// the field value; returning `None` rejects the hypothesis.
pub fn evaluate<D, T, F>(document: &D, rule: &ExtractionRule, mut accept: F) -> Extraction<T>
where
    D: Document + ?Sized,
    T: Default,
    F: FnMut(&str) -> Option<T>,
{
    for hypothesis in rule.hypotheses() {
        let Some(raw) = document.select_first(&hypothesis.query, hypothesis.attribute.as_deref())
        else {
            continue;
        };

        let value = collapse_whitespace(&raw);
        if value.is_empty() {
            continue;
        }

        if let Some(accepted) = accept(&value) {
            tracing::trace!(hypothesis = %hypothesis, "Hypothesis matched");
            return Extraction::hit(accepted);
        }
    }

    Extraction::miss()
}

/// Parses the first monetary amount in `text`
///
/// `"Price: $12.99 each"` yields `12.99`; text without digits yields `None`.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let captures = PRICE_PATTERN.captures(text)?;
    let whole = captures.get(1)?.as_str().replace(',', "");

    let amount = match captures.get(2) {
        Some(fraction) => format!("{}.{}", whole, fraction.as_str()),
        None => whole,
    };

    Decimal::from_str(&amount).ok().filter(|d| !d.is_sign_negative())
}

/// Resolves `value` against `base` and keeps it only if it is http(s)
fn resolve_url(base: &Url, value: &str) -> Option<String> {
    let url = base.join(value).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url.to_string()),
        _ => None,
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((end, _)) => value[..end].to_string(),
        None => value.to_string(),
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
