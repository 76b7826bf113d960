//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the endpoint can address `{base_url}/{resource}[/{id}]`
//! - Validate value ranges (timeouts > 0, sane backoff parameters)
//!
//! # Design Decisions
//! - Returns all validation issues, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationIssue>>
//! - Runs before a client is built from a config file

use std::fmt;
use url::Url;

use crate::config::schema::ClientConfig;

/// One semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path of the offending field (e.g., "retries.multiplier").
    pub field: &'static str,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every issue found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    match Url::parse(&config.endpoint.base_url) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                issues.push(ValidationIssue::new(
                    "endpoint.base_url",
                    format!("unsupported scheme '{}'", url.scheme()),
                ));
            }
            if url.cannot_be_a_base() {
                issues.push(ValidationIssue::new("endpoint.base_url", "URL cannot be a base"));
            }
            if url.query().is_some() || url.fragment().is_some() {
                issues.push(ValidationIssue::new(
                    "endpoint.base_url",
                    "must not carry a query or fragment",
                ));
            }
        }
        Err(e) => issues.push(ValidationIssue::new(
            "endpoint.base_url",
            format!("invalid URL '{}': {}", config.endpoint.base_url, e),
        )),
    }

    let resource = &config.endpoint.resource;
    if resource.is_empty() {
        issues.push(ValidationIssue::new("endpoint.resource", "must not be empty"));
    } else if resource.contains('/') || resource.contains('?') || resource.contains('#') {
        issues.push(ValidationIssue::new(
            "endpoint.resource",
            format!("'{}' must be a single path segment", resource),
        ));
    }

    if config.timeouts.request_ms == 0 {
        issues.push(ValidationIssue::new("timeouts.request_ms", "must be greater than 0"));
    }
    if config.timeouts.connect_ms == 0 {
        issues.push(ValidationIssue::new("timeouts.connect_ms", "must be greater than 0"));
    }

    let retries = &config.retries;
    if !(retries.multiplier >= 1.0 && retries.multiplier.is_finite()) {
        issues.push(ValidationIssue::new("retries.multiplier", "must be a finite value >= 1.0"));
    }
    if !(0.0..=1.0).contains(&retries.jitter_ratio) {
        issues.push(ValidationIssue::new("retries.jitter_ratio", "must be within [0, 1]"));
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        issues.push(ValidationIssue::new(
            "retries.base_delay_ms",
            format!(
                "base delay {}ms exceeds max delay {}ms",
                retries.base_delay_ms, retries.max_delay_ms
            ),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        issues.push(ValidationIssue::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
        assert!(validate_config(&ClientConfig::new("https://x/api", "items")).is_ok());
    }

    #[test]
    fn test_collects_all_issues() {
        let mut config = ClientConfig::new("ftp://x/api?debug=1", "a/b");
        config.timeouts.request_ms = 0;
        config.retries.multiplier = 0.5;
        config.retries.jitter_ratio = 2.0;
        config.retries.base_delay_ms = 5000;

        let issues = validate_config(&config).unwrap_err();
        let fields: Vec<_> = issues.iter().map(|i| i.field).collect();
        assert!(fields.contains(&"endpoint.base_url"));
        assert!(fields.contains(&"endpoint.resource"));
        assert!(fields.contains(&"timeouts.request_ms"));
        assert!(fields.contains(&"retries.multiplier"));
        assert!(fields.contains(&"retries.jitter_ratio"));
        assert!(fields.contains(&"retries.base_delay_ms"));
    }

    #[test]
    fn test_unparseable_url() {
        let config = ClientConfig::new("not a url", "items");
        let issues = validate_config(&config).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].to_string().starts_with("endpoint.base_url: invalid URL"));
    }
}
