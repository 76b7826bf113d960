//! Typed, retrying client for a single remote CRUD resource.

pub mod client;
pub mod config;
pub mod forms;
#[cfg(feature = "mock")]
pub mod mock;
pub mod observability;
pub mod resilience;

pub use client::{ClientError, ClientResult, Collection, Fields, Record, RecordId, ResourceClient};
pub use config::ClientConfig;
