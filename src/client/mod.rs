//! Resource client subsystem.
//!
//! # Data Flow
//! ```text
//! caller
//!     → resource.rs (build request, register PendingOperation)
//!     → resilience (deadline per attempt, retries for transport failures)
//!     → response.rs (classify status, decode body)
//!     → cache.rs (apply confirmed result)
//!     → caller (typed record/collection or ClientError)
//! ```

pub mod cache;
pub mod error;
pub mod operation;
pub mod record;
pub mod resource;
pub mod response;

pub use cache::RecordCache;
pub use error::{ClientError, ClientResult, TransportKind};
pub use operation::{OperationKind, OperationState, PendingOperation};
pub use record::{Collection, Fields, Record, RecordId};
pub use resource::ResourceClient;
