//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap each attempt (send + body read) with a deadline
//! - Map expiry to a transport timeout so the retry policy can see it
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the inner future is dropped on expiry
//! - Timeout errors are distinct from other transport errors

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::client::error::{ClientError, ClientResult};

/// Run `fut` under `deadline`, failing with `Transport { kind: Timeout }` on expiry.
pub async fn with_deadline<T, Fut>(deadline: Duration, fut: Fut) -> ClientResult<T>
where
    Fut: Future<Output = ClientResult<T>>,
{
    match timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::timeout(format!(
            "no complete response within {}ms",
            deadline.as_millis()
        ))),
    }
}
