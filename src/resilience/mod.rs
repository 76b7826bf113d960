//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Operation attempt:
//!     → timeouts.rs (bound send + body read by a deadline)
//!     → On failure: retries.rs (retry transport failures only, within the
//!       per-operation budget)
//!     → backoff.rs (delay before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every network call has a deadline
//! - Retry counts are per operation kind; create/update default to none
//! - HTTP, validation, not-found and decode failures are never retried

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use backoff::calculate_backoff;
pub use retries::execute_with_retry;
pub use timeouts::with_deadline;
