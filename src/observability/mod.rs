//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Client operations produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stderr (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - The library only emits events; installing subscribers/exporters is the
//!   binary's job
//! - Operation id flows through every event of an operation

pub mod logging;
pub mod metrics;
