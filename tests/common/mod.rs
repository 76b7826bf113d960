//! Shared utilities for integration tests.

#![allow(dead_code)]

use serde_json::Value;

use resource_client::config::{ClientConfig, RetryConfig};
use resource_client::mock::{MockOptions, MockServer};
use resource_client::{Fields, ResourceClient};

/// Start a mock service serving `resource` under `/api`.
pub async fn start_mock(resource: &str) -> MockServer {
    start_mock_with(MockOptions {
        resource: resource.to_string(),
        ..MockOptions::default()
    })
    .await
}

pub async fn start_mock_with(options: MockOptions) -> MockServer {
    MockServer::start(options).await.expect("mock server should bind")
}

/// Config with short deadlines and near-zero backoff so failure tests stay fast.
pub fn fast_config(base_url: &str, resource: &str) -> ClientConfig {
    let mut config = ClientConfig::new(base_url, resource);
    config.timeouts.request_ms = 150;
    config.timeouts.connect_ms = 150;
    config.retries = RetryConfig {
        base_delay_ms: 5,
        max_delay_ms: 20,
        ..RetryConfig::default()
    };
    config
}

pub fn client_for(server: &MockServer, resource: &str) -> ResourceClient {
    ResourceClient::new(fast_config(&server.base_url(), resource)).expect("valid client config")
}

pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}
