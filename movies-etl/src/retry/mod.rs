//! Exponential backoff retry for calls to external systems.
//!
//! `delay(attempt) = min(ceiling, base * factor^attempt)`. Transient errors
//! are retried indefinitely unless `max_attempts` is set; permanent errors
//! are returned immediately. Cancelling the policy's shutdown token ends the
//! backoff early with [`EtlError::Cancelled`].

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::errors::EtlError;

/// Default first delay.
const DEFAULT_BASE: Duration = Duration::from_millis(100);

/// Default growth factor between attempts.
const DEFAULT_FACTOR: f64 = 2.0;

/// Default upper bound for a single delay.
const DEFAULT_CEILING: Duration = Duration::from_secs(10);

/// Backoff and timeout settings shared by every external call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay after the first failure.
    pub base: Duration,
    /// Multiplier applied per attempt.
    pub factor: f64,
    /// Upper bound for a single delay.
    pub ceiling: Duration,
    /// Give up after this many attempts. `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Bound on a single attempt. An elapsed attempt counts as a transient failure.
    pub call_timeout: Option<Duration>,
    /// Interrupts the backoff sleep when cancelled.
    pub shutdown: Option<CancellationToken>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE,
            factor: DEFAULT_FACTOR,
            ceiling: DEFAULT_CEILING,
            max_attempts: None,
            call_timeout: None,
            shutdown: None,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries. Useful in tests.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: Some(1),
            ..Self::default()
        }
    }

    /// Stop backing off once `token` is cancelled.
    pub fn with_shutdown(self, token: CancellationToken) -> Self {
        Self {
            shutdown: Some(token),
            ..self
        }
    }

    /// Delay before retry number `attempt + 1`, counting from zero.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.base.as_secs_f64() * self.factor.powi(exponent);
        if !secs.is_finite() || secs >= self.ceiling.as_secs_f64() {
            self.ceiling
        } else {
            Duration::from_secs_f64(secs.max(0.0))
        }
    }
}

/// Run `op` until it succeeds, sleeping with exponential backoff between
/// transient failures.
///
/// # Arguments
///
/// * `policy` - Backoff, attempt limit and per-call timeout
/// * `operation` - Name used in logs and timeout errors
/// * `op` - Produces a fresh future per attempt
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T, EtlError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EtlError>>,
{
    let mut attempt: u32 = 0;
    loop {
        let result = match policy.call_timeout {
            Some(limit) => match timeout(limit, op()).await {
                Ok(result) => result,
                Err(_) => Err(EtlError::timeout(operation, limit)),
            },
            None => op().await,
        };

        match result {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation = %operation, attempts = attempt + 1, "Succeeded after retrying");
                }
                return Ok(value);
            }
            Err(e) if e.is_transient() && policy.max_attempts.map_or(true, |max| attempt + 1 < max) => {
                let delay = policy.delay(attempt);
                warn!(
                    operation = %operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient failure, retrying"
                );
                match &policy.shutdown {
                    Some(token) => tokio::select! {
                        _ = token.cancelled() => {
                            info!(operation = %operation, attempts = attempt + 1, "Shutdown requested, giving up");
                            return Err(EtlError::cancelled(operation));
                        }
                        _ = sleep(delay) => {}
                    },
                    None => sleep(delay).await,
                }
                attempt = attempt.saturating_add(1);
            }
            Err(e) => return Err(e),
        }
    }
}
