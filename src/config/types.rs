use crate::extract::{ExtractionRule, ExtractionRules, Field, FieldDefaults, Hypothesis};
use crate::ConfigError;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure for Shelf-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Product pages to scrape, in processing order
    #[serde(default)]
    pub urls: Vec<String>,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub fields: FieldsConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Site root used to resolve relative image paths
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Location of the crawl policy document (defaults to `<base-url>/robots.txt`)
    #[serde(rename = "policy-url", default)]
    pub policy_url: Option<String>,

    /// Lower bound of the randomized delay before each request (seconds)
    #[serde(rename = "min-delay-seconds", default = "default_min_delay")]
    pub min_delay_seconds: f64,

    /// Upper bound of the randomized delay before each request (seconds)
    #[serde(rename = "max-delay-seconds", default = "default_max_delay")]
    pub max_delay_seconds: f64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-seconds", default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Extra attempts for transient failures; zero skips the URL immediately
    #[serde(rename = "max-retries", default)]
    pub max_retries: u32,

    /// Backoff before the first retry, doubled for each further retry (seconds)
    #[serde(rename = "retry-backoff-seconds", default = "default_retry_backoff")]
    pub retry_backoff_seconds: f64,
}

fn default_min_delay() -> f64 {
    2.0
}

fn default_max_delay() -> f64 {
    5.0
}

fn default_request_timeout() -> u64 {
    30
}

fn default_retry_backoff() -> f64 {
    1.0
}

impl CrawlerConfig {
    /// Returns the policy document URL, derived from the base URL when unset
    pub fn policy_url(&self) -> String {
        match &self.policy_url {
            Some(url) => url.clone(),
            None => format!("{}/robots.txt", self.base_url.trim_end_matches('/')),
        }
    }

    /// Returns the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler; also the product token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the full User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON file receiving the scraped records
    #[serde(rename = "json-path", default = "default_json_path")]
    pub json_path: String,

    /// Optional SQLite database that also receives the records
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,
}

fn default_json_path() -> String {
    "scraped_products.json".to_string()
}

/// Per-field overrides of the built-in extraction rules and defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldsConfig {
    #[serde(default)]
    pub name: Option<FieldConfig>,
    #[serde(default)]
    pub price: Option<FieldConfig>,
    #[serde(default)]
    pub description: Option<FieldConfig>,
    #[serde(default)]
    pub image: Option<FieldConfig>,
    #[serde(default)]
    pub category: Option<FieldConfig>,
    #[serde(default)]
    pub brand: Option<FieldConfig>,
}

/// Override for a single field
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldConfig {
    /// Replacement hypothesis list, tried in order
    #[serde(default)]
    pub rules: Option<Vec<Hypothesis>>,

    /// Replacement default value
    #[serde(default)]
    pub default: Option<String>,
}

impl FieldsConfig {
    /// Returns the override for one field, if configured
    pub fn get(&self, field: Field) -> Option<&FieldConfig> {
        match field {
            Field::Name => self.name.as_ref(),
            Field::Price => self.price.as_ref(),
            Field::Description => self.description.as_ref(),
            Field::Image => self.image.as_ref(),
            Field::Category => self.category.as_ref(),
            Field::Brand => self.brand.as_ref(),
        }
    }

    /// Merges the overrides into the built-in extraction rules
    pub fn extraction_rules(&self) -> ExtractionRules {
        let mut rules = ExtractionRules::default();
        for field in Field::ALL {
            if let Some(hypotheses) = self.get(field).and_then(|f| f.rules.clone()) {
                rules.set(field, ExtractionRule::new(hypotheses));
            }
        }
        rules
    }

    /// Merges the overrides into the built-in field defaults
    pub fn field_defaults(&self) -> Result<FieldDefaults, ConfigError> {
        let mut defaults = FieldDefaults::default();
        for field in Field::ALL {
            let Some(value) = self.get(field).and_then(|f| f.default.clone()) else {
                continue;
            };
            match field {
                Field::Name => defaults.name = value,
                Field::Price => {
                    defaults.price = Decimal::from_str(value.trim()).map_err(|e| {
                        ConfigError::Validation(format!(
                            "price default '{}' is not a decimal: {}",
                            value, e
                        ))
                    })?;
                }
                Field::Description => defaults.description = value,
                Field::Image => defaults.image_url = value,
                Field::Category => defaults.category = value,
                Field::Brand => defaults.brand = value,
            }
        }
        Ok(defaults)
    }
}
