// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Retry with exponential backoff for connection establishment.
//!
//! Only connecting to the store retries. Index, load and search commands
//! run exactly once; their failures surface to the caller.
//!
//! # Example
//!
//! ```
//! use search_engine::RetryConfig;
//!
//! let startup = RetryConfig::startup();
//! assert_eq!(startup.max_attempts, 5);
//! assert_eq!(RetryConfig::once().max_attempts, 1);
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
    /// Total attempts including the first; zero behaves as one
    pub max_attempts: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::startup()
    }
}

impl RetryConfig {
    /// Fast-fail retry for the initial connection.
    /// 5 attempts with exponential backoff, giving up after ~3 seconds.
    #[must_use]
    pub fn startup() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
        }
    }

    /// Single attempt
    #[must_use]
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            ..Self::startup()
        }
    }

    /// Backoff before the attempt following `delay`
    fn next_delay(&self, delay: Duration) -> Duration {
        delay.mul_f64(self.factor).min(self.max_delay)
    }
}

pub async fn retry<F, Fut, T, E>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(val) => {
                if attempt > 1 {
                    info!(operation = operation_name, attempt, "Operation succeeded after retry");
                }
                return Ok(val);
            }
            Err(err) if attempt >= max_attempts => return Err(err),
            Err(err) => {
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    error = %err,
                    retry_in = ?delay,
                    "Operation failed, retrying"
                );
                sleep(delay).await;
                delay = config.next_delay(delay);
                attempt += 1;
            }
        }
    }
}
