//! Retrying fallible async operations.
//!
//! [`retry`] is the simple form: a fixed number of attempts with a fixed
//! delay, returning the last error. [`retry_with`] takes a [`RetryStrategy`]
//! for the delays and a [`RetryPredicate`] deciding which errors are worth
//! another attempt.

use crate::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Default attempt count for [`retry`].
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Default delay between attempts for [`retry`].
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1_000);

/// Runs `operation` up to `max_attempts` times, sleeping `delay` between
/// failed attempts.
///
/// Returns the first success or, once the attempts are used up, the last
/// error. There is no sleep after the final attempt. `max_attempts == 0` runs
/// the operation once.
///
/// # Examples
///
/// ```no_run
/// use biblio_http::retry::retry;
/// use biblio_http::{Client, Params};
/// use std::time::Duration;
///
/// # async fn example(client: Client) -> Result<(), biblio_http::Error> {
/// let params = Params::new();
/// let response = retry(
///     || client.get("/api/books", &params),
///     3,
///     Duration::from_millis(500),
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry<F, Fut, T, E>(mut operation: F, max_attempts: usize, delay: Duration) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => {
                tracing::warn!(attempts = attempt, error = %e, "Giving up after final attempt");
                return Err(e);
            }
            Err(e) => {
                tracing::info!(
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Runs `operation`, retrying per `strategy` while `predicate` accepts the error.
///
/// An error the predicate rejects is returned unchanged. When the strategy
/// has no delay left the result is [`Error::MaxRetriesExceeded`] wrapping the
/// last error.
///
/// # Examples
///
/// ```no_run
/// use biblio_http::retry::{retry_with, RetryOnRetryable, RetryStrategy};
/// use biblio_http::{Client, Params};
/// use std::time::Duration;
///
/// # async fn example(client: Client) -> Result<(), biblio_http::Error> {
/// let strategy = RetryStrategy::ExponentialBackoff {
///     initial_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(5),
///     max_retries: 4,
///     jitter: true,
/// };
/// let params = Params::new();
/// let response = retry_with(
///     || client.get("/api/books", &params),
///     &strategy,
///     &RetryOnRetryable,
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_with<F, Fut, T>(
    mut operation: F,
    strategy: &RetryStrategy,
    predicate: &dyn RetryPredicate,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !predicate.should_retry(&error, attempt) {
            tracing::debug!(attempt = attempt, error = %error, "Error is not retryable");
            return Err(error);
        }

        match strategy.delay_for_attempt(attempt) {
            Some(delay) => {
                tracing::info!(
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Retrying after failure"
                );
                tokio::time::sleep(delay).await;
            }
            None => {
                tracing::warn!(attempts = attempt, error = %error, "Retries exhausted");
                return Err(Error::MaxRetriesExceeded {
                    attempts: attempt,
                    last_error: Box::new(error),
                });
            }
        }
    }
}

/// How long to wait before each retry, and when to give up.
///
/// # Examples
///
/// ```
/// use biblio_http::RetryStrategy;
/// use std::time::Duration;
///
/// // 100ms, 200ms, 400ms, 800ms
/// let exponential = RetryStrategy::ExponentialBackoff {
///     initial_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(30),
///     max_retries: 4,
///     jitter: false,
/// };
///
/// let linear = RetryStrategy::Linear {
///     delay: Duration::from_secs(1),
///     max_retries: 3,
/// };
/// assert_eq!(linear.max_retries(), Some(3));
/// ```
#[derive(Debug, Clone, Default)]
pub enum RetryStrategy {
    /// Never retry.
    #[default]
    None,

    /// `initial_delay * 2^(attempt - 1)`, capped at `max_delay`.
    ///
    /// With `jitter` each delay is scaled by a random factor in `[0.5, 1.0]`.
    ExponentialBackoff {
        /// Delay before the first retry.
        initial_delay: Duration,
        /// Upper bound for any delay.
        max_delay: Duration,
        /// Retries allowed after the first attempt.
        max_retries: usize,
        /// Randomize delays.
        jitter: bool,
    },

    /// The same delay before every retry.
    Linear {
        /// Delay between attempts.
        delay: Duration,
        /// Retries allowed after the first attempt.
        max_retries: usize,
    },

    /// Delay chosen by a function of the attempt number (1-indexed);
    /// `None` stops.
    Custom {
        /// Delay function.
        delay_fn: fn(attempt: usize) -> Option<Duration>,
    },
}

impl RetryStrategy {
    /// Delay before retry number `attempt` (1 = first retry), or `None` when exhausted.
    pub fn delay_for_attempt(&self, attempt: usize) -> Option<Duration> {
        match self {
            RetryStrategy::None => None,
            RetryStrategy::ExponentialBackoff {
                initial_delay,
                max_delay,
                max_retries,
                jitter,
            } => {
                if attempt > *max_retries {
                    return None;
                }

                let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                let multiplier = 2u32.saturating_pow(exponent);
                let delay = initial_delay.saturating_mul(multiplier).min(*max_delay);

                if *jitter {
                    let factor = rand::thread_rng().gen_range(0.5..=1.0);
                    Some(delay.mul_f64(factor))
                } else {
                    Some(delay)
                }
            }
            RetryStrategy::Linear { delay, max_retries } => {
                (attempt <= *max_retries).then_some(*delay)
            }
            RetryStrategy::Custom { delay_fn } => delay_fn(attempt),
        }
    }

    /// Maximum number of retries, if bounded.
    pub fn max_retries(&self) -> Option<usize> {
        match self {
            RetryStrategy::None => Some(0),
            RetryStrategy::ExponentialBackoff { max_retries, .. } => Some(*max_retries),
            RetryStrategy::Linear { max_retries, .. } => Some(*max_retries),
            RetryStrategy::Custom { .. } => None,
        }
    }
}

/// Decides whether a failed attempt should be retried.
///
/// # Examples
///
/// ```
/// use biblio_http::{Error, RetryPredicate};
///
/// struct RetryOnConflict;
///
/// impl RetryPredicate for RetryOnConflict {
///     fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
///         error.status().is_some_and(|s| s.as_u16() == 409)
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// `attempt` is the number of the attempt that just failed (1-indexed).
    fn should_retry(&self, error: &Error, attempt: usize) -> bool;
}

/// Retries whatever [`Error::is_retryable`] accepts.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRetryable;

impl RetryPredicate for RetryOnRetryable {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.is_retryable()
    }
}

/// Retries 5xx responses only.
#[derive(Debug, Clone, Copy)]
pub struct RetryOn5xx;

impl RetryPredicate for RetryOn5xx {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.is_server_error()
    }
}

/// Retries timeouts only.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnTimeout;

impl RetryPredicate for RetryOnTimeout {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::Timeout)
    }
}

/// Retries failures where no response arrived.
#[derive(Debug, Clone, Copy)]
pub struct RetryOnConnectionError;

impl RetryPredicate for RetryOnConnectionError {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        matches!(error, Error::Network(e) if !e.is_status())
    }
}

/// Retries if any inner predicate does.
///
/// ```
/// use biblio_http::retry::{OrPredicate, RetryOn5xx, RetryOnTimeout};
///
/// let predicate = OrPredicate::new(vec![Box::new(RetryOn5xx), Box::new(RetryOnTimeout)]);
/// ```
pub struct OrPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl OrPredicate {
    /// Combines `predicates`.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for OrPredicate {
    fn should_retry(&self, error: &Error, attempt: usize) -> bool {
        self.predicates.iter().any(|p| p.should_retry(error, attempt))
    }
}

/// Retries only if every inner predicate does.
pub struct AndPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl AndPredicate {
    /// Combines `predicates`.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for AndPredicate {
    fn should_retry(&self, error: &Error, attempt: usize) -> bool {
        self.predicates.iter().all(|p| p.should_retry(error, attempt))
    }
}
