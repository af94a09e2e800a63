//! Parsed-document seam used by the field extractor

use scraper::{Html, Selector};

/// Query capability the extractor needs from a parsed page
pub trait Document {
    /// Resolves the first node matching `query` and reads a value from it
    ///
    /// Without an `attribute` the node's text content is returned. Returns
    /// `None` when no node matches or the node lacks the attribute.
    fn select_first(&self, query: &str, attribute: Option<&str>) -> Option<String>;
}

/// An HTML page parsed with `scraper`
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parses a complete HTML document
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// Parses a body that may not be valid UTF-8
    pub fn parse_bytes(body: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(body))
    }
}

impl Document for HtmlDocument {
    fn select_first(&self, query: &str, attribute: Option<&str>) -> Option<String> {
        let selector = match Selector::parse(query) {
            Ok(selector) => selector,
            Err(e) => {
                tracing::debug!(query, error = ?e, "Skipping unparseable selector");
                return None;
            }
        };

        let element = self.html.select(&selector).next()?;

        match attribute {
            Some(name) => element.value().attr(name).map(str::to_string),
            None => Some(element.text().collect::<String>()),
        }
    }
}
