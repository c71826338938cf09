//! Fixed-budget retry with a static fallback.
//!
//! Every call that reaches an external provider goes through here. The delay
//! between attempts is constant and there is no circuit breaker. Any error
//! takes the same path.
//!
//! ```rust,ignore
//! let policy = ResiliencePolicy::new(2, Duration::from_millis(200))
//!     .with_fallback(|_query: &str| placeholder_ranking(3));
//! let ranked = with_resilience("dense_score", &policy, query, |q| scorer.retrieve(q, 10)).await;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::config::RetrySettings;
use crate::types::ScoredPosition;

/// Produces a result from the original call arguments once retries are spent.
pub type Fallback<A, T> = Arc<dyn Fn(&A) -> T + Send + Sync>;

pub struct ResiliencePolicy<A: ?Sized, T> {
    /// Additional attempts after the first failure.
    pub retries: u32,
    /// Pause between attempts; zero retries immediately.
    pub delay: Duration,
    fallback: Option<Fallback<A, T>>,
}

impl<A: ?Sized, T> ResiliencePolicy<A, T> {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay, fallback: None }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(settings.retries, settings.delay())
    }

    #[must_use]
    pub fn with_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&A) -> T + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

impl<A: ?Sized, T> Clone for ResiliencePolicy<A, T> {
    fn clone(&self) -> Self {
        Self { retries: self.retries, delay: self.delay, fallback: self.fallback.clone() }
    }
}

impl<A: ?Sized, T> fmt::Debug for ResiliencePolicy<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResiliencePolicy")
            .field("retries", &self.retries)
            .field("delay", &self.delay)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Result of the bounded retry loop before any fallback is considered.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: anyhow::Result<T>,
    pub attempts: u32,
    /// Pauses taken between attempts.
    pub delays: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Succeeded,
    Fallback,
    Default,
}

#[derive(Debug)]
pub struct ResilienceOutcome<T> {
    pub value: T,
    pub attempts: u32,
    pub delays: u32,
    pub resolution: Resolution,
}

/// Run `operation` up to `retries + 1` times, returning the last error if
/// every attempt fails. Used directly where failure must propagate (the
/// offline pipeline); online paths go through [`with_resilience`].
pub async fn retry<'a, A, T, F, Fut>(
    name: &str,
    retries: u32,
    delay: Duration,
    args: &'a A,
    mut operation: F,
) -> RetryOutcome<T>
where
    A: ?Sized,
    F: FnMut(&'a A) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempts = 0u32;
    let mut delays = 0u32;
    loop {
        attempts += 1;
        match operation(args).await {
            Ok(value) => return RetryOutcome { result: Ok(value), attempts, delays },
            Err(e) => {
                warn!(operation = name, attempt = attempts, error = %e, "attempt failed");
                if attempts > retries {
                    return RetryOutcome { result: Err(e), attempts, delays };
                }
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                delays += 1;
            }
        }
    }
}

/// Retry, then fall back; never returns an error.
pub async fn with_resilience_outcome<'a, A, T, F, Fut>(
    name: &str,
    policy: &ResiliencePolicy<A, T>,
    args: &'a A,
    operation: F,
) -> ResilienceOutcome<T>
where
    A: ?Sized,
    T: Default,
    F: FnMut(&'a A) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let RetryOutcome { result, attempts, delays } =
        retry(name, policy.retries, policy.delay, args, operation).await;
    resolve(name, policy, args, result, attempts, delays)
}

pub async fn with_resilience<'a, A, T, F, Fut>(
    name: &str,
    policy: &ResiliencePolicy<A, T>,
    args: &'a A,
    operation: F,
) -> T
where
    A: ?Sized,
    T: Default,
    F: FnMut(&'a A) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    with_resilience_outcome(name, policy, args, operation).await.value
}

/// Blocking counterpart of [`with_resilience_outcome`] for synchronous
/// operations; sleeps the current thread between attempts.
pub fn with_resilience_blocking<A, T, F>(
    name: &str,
    policy: &ResiliencePolicy<A, T>,
    args: &A,
    mut operation: F,
) -> ResilienceOutcome<T>
where
    A: ?Sized,
    T: Default,
    F: FnMut(&A) -> anyhow::Result<T>,
{
    let mut attempts = 0u32;
    let mut delays = 0u32;
    let result = loop {
        attempts += 1;
        match operation(args) {
            Ok(value) => break Ok(value),
            Err(e) => {
                warn!(operation = name, attempt = attempts, error = %e, "attempt failed");
                if attempts > policy.retries {
                    break Err(e);
                }
                if !policy.delay.is_zero() {
                    std::thread::sleep(policy.delay);
                }
                delays += 1;
            }
        }
    };
    resolve(name, policy, args, result, attempts, delays)
}

fn resolve<A: ?Sized, T: Default>(
    name: &str,
    policy: &ResiliencePolicy<A, T>,
    args: &A,
    result: anyhow::Result<T>,
    attempts: u32,
    delays: u32,
) -> ResilienceOutcome<T> {
    match result {
        Ok(value) => {
            ResilienceOutcome { value, attempts, delays, resolution: Resolution::Succeeded }
        }
        Err(_) => match &policy.fallback {
            Some(fallback) => {
                warn!(operation = name, attempts, "retries exhausted, using fallback");
                ResilienceOutcome {
                    value: (**fallback)(args),
                    attempts,
                    delays,
                    resolution: Resolution::Fallback,
                }
            }
            None => {
                warn!(
                    operation = name,
                    attempts,
                    "retries exhausted and no fallback defined, returning default"
                );
                ResilienceOutcome {
                    value: T::default(),
                    attempts,
                    delays,
                    resolution: Resolution::Default,
                }
            }
        },
    }
}

/// Static, non-personalized ranking: the first `count` positions at score 0.
pub fn placeholder_ranking(count: usize) -> Vec<ScoredPosition> {
    (0..count).map(|i| ScoredPosition::new(i, 0.0)).collect()
}
