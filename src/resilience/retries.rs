//! Retry logic.
//!
//! # Responsibilities
//! - Drive one operation through its state machine, attempt by attempt
//! - Retry transport failures with exponential backoff + jitter
//! - Enforce the per-operation retry budget from `RetryConfig`
//!
//! # Design Decisions
//! - Only `ClientError::Transport` is retryable; everything else is final
//! - Create/update default to zero retries (non-idempotent)
//! - Each attempt receives the operation id to send as `X-Request-Id`

use std::future::Future;
use std::time::Instant;
use uuid::Uuid;

use crate::client::error::ClientResult;
use crate::client::operation::{InFlight, PendingOperation};
use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;

/// Run `attempt` until it succeeds, fails permanently, or retries run out.
pub async fn execute_with_retry<T, F, Fut>(
    op: &mut PendingOperation,
    config: &RetryConfig,
    in_flight: &InFlight,
    mut attempt: F,
) -> ClientResult<T>
where
    F: FnMut(Uuid) -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let max_retries = config.max_retries(op.kind);
    let start_time = Instant::now();

    loop {
        op.begin_attempt();
        in_flight.update(op);

        tracing::debug!(
            operation_id = %op.id,
            operation = %op.kind,
            attempt = op.attempts,
            "Sending request"
        );

        let error = match attempt(op.id).await {
            Ok(value) => {
                op.succeed();
                metrics::record_request(op.kind, "success", start_time);
                if op.attempts > 1 {
                    tracing::debug!(operation_id = %op.id, attempts = op.attempts, "Succeeded after retries");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        let retries_left = op.attempts <= max_retries;
        if op.fail(error.is_transient(), retries_left) {
            let delay = calculate_backoff(op.attempts, config);
            tracing::info!(
                operation_id = %op.id,
                operation = %op.kind,
                attempt = op.attempts,
                delay = ?delay,
                error = %error,
                "Retrying after transport error"
            );
            metrics::record_retry(op.kind);
            in_flight.update(op);
            tokio::time::sleep(delay).await;
            continue;
        }

        tracing::warn!(
            operation_id = %op.id,
            operation = %op.kind,
            attempts = op.attempts,
            error = %error,
            "Operation failed"
        );
        metrics::record_request(op.kind, error.label(), start_time);
        return Err(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::error::ClientError;
    use crate::client::operation::{OperationKind, OperationState};

    fn fast_config(list_retries: u32) -> RetryConfig {
        RetryConfig {
            list_max_retries: list_retries,
            base_delay_ms: 1,
            max_delay_ms: 5,
            ..RetryConfig::default()
        }
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let mut op = PendingOperation::new(OperationKind::List, None, None);
        let mut calls = 0;
        let result = execute_with_retry(&mut op, &fast_config(3), &InFlight::new(), |_| {
            calls += 1;
            let n = calls;
            async move {
                if n < 3 {
                    Err(ClientError::timeout("slow"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(op.attempts, 3);
        assert_eq!(op.state, OperationState::Succeeded);
    }

    #[tokio::test]
    async fn test_budget_exhausted() {
        let mut op = PendingOperation::new(OperationKind::List, None, None);
        let mut calls = 0;
        let result: ClientResult<()> = execute_with_retry(&mut op, &fast_config(2), &InFlight::new(), |_| {
            calls += 1;
            async { Err(ClientError::timeout("slow")) }
        })
        .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls, 3);
        assert_eq!(op.state, OperationState::FailedPermanent);
    }

    #[tokio::test]
    async fn test_non_transient_not_retried() {
        let mut op = PendingOperation::new(OperationKind::List, None, None);
        let mut calls = 0;
        let result: ClientResult<()> = execute_with_retry(&mut op, &fast_config(5), &InFlight::new(), |_| {
            calls += 1;
            async {
                Err(ClientError::Http {
                    status: 503,
                    body: String::new(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(ClientError::Http { status: 503, .. })));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_create_not_retried_by_default() {
        let mut op = PendingOperation::new(OperationKind::Create, None, None);
        let mut calls = 0;
        let _ = execute_with_retry::<(), _, _>(&mut op, &RetryConfig::default(), &InFlight::new(), |_| {
            calls += 1;
            async { Err(ClientError::timeout("slow")) }
        })
        .await;
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_same_request_id_across_attempts() {
        let mut op = PendingOperation::new(OperationKind::Delete, None, None);
        let expected = op.id;
        let mut seen = Vec::new();
        let _ = execute_with_retry::<(), _, _>(&mut op, &fast_config(0), &InFlight::new(), |request_id| {
            seen.push(request_id);
            async { Err(ClientError::timeout("slow")) }
        })
        .await;
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|id| *id == expected));
    }
}
