use crate::config::types::{Config, CrawlerConfig, FieldsConfig, OutputConfig, UserAgentConfig};
use crate::extract::{Field, DESCRIPTION_MAX_CHARS};
use crate::ConfigError;
use rust_decimal::Decimal;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_fields_config(&config.fields)?;
    validate_target_urls(&config.urls, &config.crawler.base_url)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    parse_http_url("base_url", &config.base_url)?;
    parse_http_url("policy_url", &config.policy_url())?;

    for (name, value) in [
        ("min_delay_seconds", config.min_delay_seconds),
        ("max_delay_seconds", config.max_delay_seconds),
        ("retry_backoff_seconds", config.retry_backoff_seconds),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Validation(format!(
                "{} must be a non-negative number, got {}",
                name, value
            )));
        }
    }

    if config.min_delay_seconds > config.max_delay_seconds {
        return Err(ConfigError::Validation(format!(
            "min_delay_seconds ({}) must not exceed max_delay_seconds ({})",
            config.min_delay_seconds, config.max_delay_seconds
        )));
    }

    if config.request_timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_seconds must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name doubles as the robots.txt product token
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.json_path.is_empty() {
        return Err(ConfigError::Validation(
            "json_path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.database_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "database_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates per-field rule and default overrides
fn validate_fields_config(config: &FieldsConfig) -> Result<(), ConfigError> {
    for field in Field::ALL {
        let Some(field_config) = config.get(field) else {
            continue;
        };

        if let Some(rules) = &field_config.rules {
            if rules.is_empty() {
                return Err(ConfigError::InvalidRule {
                    field: field.to_string(),
                    message: "rule list must contain at least one hypothesis".to_string(),
                });
            }
            for hypothesis in rules {
                if hypothesis.query.trim().is_empty() {
                    return Err(ConfigError::InvalidRule {
                        field: field.to_string(),
                        message: "hypothesis query cannot be empty".to_string(),
                    });
                }
                if matches!(&hypothesis.attribute, Some(attr) if attr.trim().is_empty()) {
                    return Err(ConfigError::InvalidRule {
                        field: field.to_string(),
                        message: format!(
                            "attribute name for '{}' cannot be empty",
                            hypothesis.query
                        ),
                    });
                }
            }
        }
    }

    let defaults = config.field_defaults()?;

    if defaults.price < Decimal::ZERO {
        return Err(ConfigError::Validation(format!(
            "price default must be >= 0, got {}",
            defaults.price
        )));
    }

    if defaults.description.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(ConfigError::Validation(format!(
            "description default must be at most {} characters",
            DESCRIPTION_MAX_CHARS
        )));
    }

    if !defaults.image_url.is_empty() {
        parse_http_url("image default", &defaults.image_url)?;
    }

    Ok(())
}

/// Validates that every target is an absolute URL on the configured site
fn validate_target_urls(urls: &[String], base_url: &str) -> Result<(), ConfigError> {
    let base = parse_http_url("base_url", base_url)?;

    for raw in urls {
        let url = parse_http_url("target URL", raw)?;
        if url.host_str() != base.host_str() {
            return Err(ConfigError::Validation(format!(
                "Target URL '{}' is not on the configured site '{}'",
                raw,
                base.host_str().unwrap_or_default()
            )));
        }
    }

    Ok(())
}

/// Parses an absolute http(s) URL
fn parse_http_url(label: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", label, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            label, raw
        )));
    }

    Ok(url)
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
