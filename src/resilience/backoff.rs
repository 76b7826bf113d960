//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;

/// Calculate the delay before retry number `retry` (1-based).
///
/// `min(base * multiplier^(retry-1), max)` plus a random jitter in
/// `[0, delay * jitter_ratio)`.
pub fn calculate_backoff(retry: u32, config: &RetryConfig) -> Duration {
    if retry == 0 || config.base_delay_ms == 0 {
        return Duration::from_millis(0);
    }

    let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
    let delay_ms = (config.base_delay_ms as f64) * config.multiplier.max(1.0).powi(exponent);
    let capped_delay = delay_ms.min(config.max_delay_ms as f64) as u64;

    let jitter_range = (capped_delay as f64 * config.jitter_ratio.clamp(0.0, 1.0)) as u64;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}
