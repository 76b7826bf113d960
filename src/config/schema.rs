//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a resource client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::client::operation::OperationKind;

/// Root configuration for a resource client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Which remote collection to talk to.
    pub endpoint: EndpointConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Local cache settings.
    pub cache: CacheConfig,

    /// Assumptions about the server's delete semantics.
    pub delete: DeleteConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ClientConfig {
    /// Config targeting `{base_url}/{resource}` with defaults everywhere else.
    pub fn new(base_url: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            endpoint: EndpointConfig {
                base_url: base_url.into(),
                resource: resource.into(),
            },
            ..Self::default()
        }
    }
}

/// Remote collection identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Service base URL (e.g., "https://apistreamline.com/mock/project").
    pub base_url: String,

    /// Resource (collection) name, a single path segment.
    pub resource: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            resource: "users".to_string(),
        }
    }
}

/// Timeout configuration for network calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for one attempt (send + full body read) in milliseconds.
    pub request_ms: u64,

    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_ms: 10_000,
            connect_ms: 5_000,
        }
    }
}

/// Retry configuration.
///
/// Retry counts are per operation kind. Create and update are not idempotent,
/// so they get no retries unless explicitly configured.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum retries (beyond the first attempt) for list.
    pub list_max_retries: u32,

    /// Maximum retries for create.
    pub create_max_retries: u32,

    /// Maximum retries for update.
    pub update_max_retries: u32,

    /// Maximum retries for delete.
    pub delete_max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Growth factor applied per retry.
    pub multiplier: f64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Upper bound of the random jitter as a fraction of the delay.
    /// e.g., 0.1 adds up to 10%.
    pub jitter_ratio: f64,
}

impl RetryConfig {
    /// No retries for any operation.
    pub fn disabled() -> Self {
        Self {
            list_max_retries: 0,
            create_max_retries: 0,
            update_max_retries: 0,
            delete_max_retries: 0,
            ..Self::default()
        }
    }

    pub fn max_retries(&self, kind: OperationKind) -> u32 {
        match kind {
            OperationKind::List => self.list_max_retries,
            OperationKind::Create => self.create_max_retries,
            OperationKind::Update => self.update_max_retries,
            OperationKind::Delete => self.delete_max_retries,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            list_max_retries: 2,
            create_max_retries: 0,
            update_max_retries: 0,
            delete_max_retries: 2,
            base_delay_ms: 100,
            multiplier: 2.0,
            max_delay_ms: 2000,
            jitter_ratio: 0.1,
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Keep an in-memory copy of the last listed collection.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Delete semantics.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DeleteConfig {
    /// Treat 404 on delete as success (server delete assumed idempotent).
    pub treat_missing_as_deleted: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
