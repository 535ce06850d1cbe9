//! Retry with exponential backoff for resolver HTTP calls.
//!
//! Resolver lookups are blocking, so backoff sleeps the calling thread.

use std::thread::sleep;
use std::time::{Duration, Instant};

use crate::sources::SourceError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum total time to spend on retries (including delays)
    pub max_total_time: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            max_total_time: Duration::from_secs(90),
        }
    }
}

impl RetryConfig {
    /// Set the number of attempts
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Configuration that never retries
    pub fn none() -> Self {
        Self::default().max_attempts(1)
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let secs = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powf(attempt.saturating_sub(1) as f64);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Transient errors that should trigger a retry
#[derive(Debug, Clone, PartialEq)]
pub enum TransientError {
    /// Network connectivity issues
    Network,
    /// Rate limit exceeded
    RateLimit,
    /// Server error (5xx)
    ServerError,
}

impl TransientError {
    /// Classify an HTTP status code
    pub fn from_status(status: reqwest::StatusCode) -> Option<Self> {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Some(TransientError::RateLimit)
        } else if status.is_server_error() {
            Some(TransientError::ServerError)
        } else {
            None
        }
    }

    /// Check if a SourceError represents a transient error
    pub fn from_source_error(err: &SourceError) -> Option<Self> {
        match err {
            SourceError::RateLimit => Some(TransientError::RateLimit),
            SourceError::Network(_) => Some(TransientError::Network),
            SourceError::Api(msg) if msg.contains("status: 5") => Some(TransientError::ServerError),
            _ => None,
        }
    }
}

/// Execute a blocking operation, retrying transient failures with backoff
pub fn with_retry<T, F>(config: RetryConfig, mut operation: F) -> Result<T, SourceError>
where
    F: FnMut() -> Result<T, SourceError>,
{
    let started = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;

        let error = match operation() {
            Ok(result) => {
                if attempts > 1 {
                    tracing::debug!("Operation succeeded on attempt {}", attempts);
                }
                return Ok(result);
            }
            Err(error) => error,
        };

        let Some(transient) = TransientError::from_source_error(&error) else {
            return Err(error);
        };

        let delay = config.delay_for(attempts);
        if attempts >= config.max_attempts || started.elapsed() + delay >= config.max_total_time {
            tracing::warn!("Operation failed after {} attempts: {}", attempts, error);
            return Err(error);
        }

        tracing::warn!(
            "Transient error on attempt {} ({:?}), retrying in {:?}",
            attempts,
            transient,
            delay
        );
        sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            max_total_time: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_retry_success_first_try() {
        let calls = Cell::new(0);
        let result = with_retry(fast(3), || {
            calls.set(calls.get() + 1);
            Ok("success")
        });

        assert_eq!(result.unwrap(), "success");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_retry_success_after_failures() {
        let calls = Cell::new(0);
        let result = with_retry(fast(4), || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(SourceError::Network("temporary error".to_string()))
            } else {
                Ok("success")
            }
        });

        assert_eq!(result.unwrap(), "success");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retry(fast(2), || {
            calls.set(calls.get() + 1);
            Err(SourceError::RateLimit)
        });

        assert!(matches!(result, Err(SourceError::RateLimit)));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_retry_returns_permanent_error() {
        let calls = Cell::new(0);
        let result: Result<(), _> = with_retry(fast(5), || {
            calls.set(calls.get() + 1);
            Err(SourceError::NotFound("not found".to_string()))
        });

        assert!(matches!(result, Err(SourceError::NotFound(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_transient_error_detection() {
        assert_eq!(
            TransientError::from_source_error(&SourceError::RateLimit),
            Some(TransientError::RateLimit)
        );
        assert!(TransientError::from_source_error(&SourceError::Network("x".into())).is_some());
        assert!(TransientError::from_source_error(&SourceError::Parse("x".into())).is_none());
        assert_eq!(
            TransientError::from_status(reqwest::StatusCode::BAD_GATEWAY),
            Some(TransientError::ServerError)
        );
        assert_eq!(TransientError::from_status(reqwest::StatusCode::NOT_FOUND), None);
    }
}
