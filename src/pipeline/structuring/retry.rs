//! Bounded retry of the generate-then-repair unit.
//!
//! [`RetryPolicy::decide`] is a pure function of the attempt number and its
//! failure; [`run_with_retry`] applies it around an async attempt.

use std::future::Future;
use std::time::Duration;

use super::StructuringError;
use crate::pipeline::repair::RepairExhausted;

/// Default number of additional attempts after the first.
pub const DEFAULT_MAX_RETRIES: usize = 2;

/// Why one attempt did not produce a usable object.
#[derive(Debug)]
pub enum AttemptFailure {
    /// The model call failed in a way a new call may not.
    Generation(StructuringError),
    /// The model answered but no repair stage produced an object.
    Unparseable(RepairExhausted),
    /// Retrying cannot help.
    Fatal(StructuringError),
}

impl AttemptFailure {
    /// Classify a model-call error.
    pub fn from_call(error: StructuringError) -> Self {
        if error.is_retryable() {
            Self::Generation(error)
        } else {
            Self::Fatal(error)
        }
    }
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generation(e) | Self::Fatal(e) => write!(f, "{e}"),
            Self::Unparseable(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    GiveUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one.
    pub max_retries: usize,
    /// Base delay, multiplied by the attempt number.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }

    /// Decide what follows failed attempt `attempt` (zero-based).
    pub fn decide(&self, attempt: usize, failure: &AttemptFailure) -> RetryDecision {
        if matches!(failure, AttemptFailure::Fatal(_)) || attempt >= self.max_retries {
            return RetryDecision::GiveUp;
        }
        let factor = u32::try_from(attempt + 1).unwrap_or(u32::MAX);
        RetryDecision::Retry {
            delay: self.backoff.saturating_mul(factor),
        }
    }
}

/// Run `attempt` until it succeeds or the policy gives up, returning the
/// last failure in that case.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut attempt: F,
) -> Result<T, AttemptFailure>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, AttemptFailure>>,
{
    let mut n = 0;
    loop {
        let failure = match attempt(n).await {
            Ok(value) => return Ok(value),
            Err(failure) => failure,
        };
        match policy.decide(n, &failure) {
            RetryDecision::Retry { delay } => {
                tracing::warn!(
                    attempt = n + 1,
                    max_attempts = policy.max_attempts(),
                    error = %failure,
                    "Analysis attempt failed, retrying"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                n += 1;
            }
            RetryDecision::GiveUp => return Err(failure),
        }
    }
}
