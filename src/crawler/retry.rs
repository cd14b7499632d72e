//! Bounded retry for store operations
//!
//! Lock contention between workers is expected and short-lived. Every store
//! mutation in the worker goes through [`RetryPolicy::run`], which retries
//! contention errors a fixed number of times with a fixed delay and passes
//! every other error straight through.

use crate::config::RetryConfig;
use crate::storage::{StorageError, StorageResult};
use std::time::Duration;

/// Retry policy for store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy making at most `max_attempts` attempts (minimum 1)
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Builds the policy from the retry section of the configuration
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.delay())
    }

    /// Total attempts per operation, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns true if the error should be retried
    pub fn is_retryable(error: &StorageError) -> bool {
        error.is_contention()
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or
    /// the attempts are used up
    ///
    /// # Arguments
    ///
    /// * `label` - Operation name used in log messages
    /// * `op` - The store operation
    pub async fn run<T, F>(&self, label: &str, mut op: F) -> StorageResult<T>
    where
        F: FnMut() -> StorageResult<T>,
    {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if Self::is_retryable(&e) && attempt < self.max_attempts => {
                    tracing::debug!(
                        "{} hit lock contention (attempt {}/{}): {}",
                        label,
                        attempt,
                        self.max_attempts,
                        e
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if Self::is_retryable(&e) {
                        tracing::error!(
                            "{} abandoned after {} attempts: {}",
                            label,
                            self.max_attempts,
                            e
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
