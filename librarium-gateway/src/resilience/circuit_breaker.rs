//! Circuit breaker with a sliding window of recent call outcomes.
//!
//! # States
//!
//! - **Closed**: calls pass through; each outcome is recorded into a
//!   fixed-size circular window. When the fraction of failed slots reaches
//!   the configured threshold, the breaker opens.
//! - **Open**: calls are rejected without touching the dependency until
//!   `open_timeout` has elapsed since the breaker opened.
//! - **HalfOpen**: calls pass through as probes. One failure reopens the
//!   breaker; enough consecutive successes reset it to Closed.
//!
//! The window divides by its fixed size even before it has been fully
//! populated, so slots never written count as successes and a young breaker
//! is biased toward staying closed.
//!
//! # Example
//!
//! ```no_run
//! use librarium_gateway::resilience::{CircuitBreaker, CircuitBreakerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let breaker = CircuitBreaker::new("library", CircuitBreakerConfig::default());
//!
//! match breaker.call(|| async { Ok::<_, std::io::Error>(42) }).await {
//!     Ok(result) => println!("Success: {}", result),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, requests pass through
    Closed,
    /// Too many failures, requests are rejected
    Open,
    /// Probing whether the dependency has recovered
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "Closed"),
            CircuitState::Open => write!(f, "Open"),
            CircuitState::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// Configuration for circuit breaker
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of most-recent calls tracked in the circular window
    pub window_size: usize,
    /// Fraction of failed slots in (0, 1] at which the breaker opens
    pub failure_threshold: f64,
    /// Time to wait in Open before admitting a half-open probe
    pub open_timeout: Duration,
    /// Consecutive successes beyond this count close a half-open breaker
    pub recovery_requests: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            failure_threshold: 0.2,
            open_timeout: Duration::from_secs(1),
            recovery_requests: 2,
        }
    }
}

/// Circuit breaker errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open; the wrapped call was not invoked. Callers must not
    /// retry synchronously: fail the request or take the deferred path.
    #[error("circuit breaker is open for {name}")]
    Open { name: String },

    /// The wrapped call ran and failed; the inner error is untouched.
    #[error("{0}")]
    ExecutionFailed(E),
}

/// Per-breaker counters, exported for observability.
#[derive(Debug, Default)]
struct Counters {
    successes: AtomicU64,
    failures: AtomicU64,
    opened_count: AtomicU64,
    closed_count: AtomicU64,
    rejected_count: AtomicU64,
}

/// Snapshot of a breaker's counters.
#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub successes: u64,
    pub failures: u64,
    pub opened_count: u64,
    pub closed_count: u64,
    pub rejected_count: u64,
}

struct BreakerState {
    state: CircuitState,
    /// Circular buffer: slot = true means that call failed.
    window: Vec<bool>,
    pos: usize,
    consecutive_successes: usize,
    last_opened_at: Option<Instant>,
}

impl BreakerState {
    fn new(window_size: usize) -> Self {
        Self {
            state: CircuitState::Closed,
            window: vec![false; window_size],
            pos: 0,
            consecutive_successes: 0,
            last_opened_at: None,
        }
    }

    fn open(&mut self) {
        self.state = CircuitState::Open;
        self.consecutive_successes = 0;
        self.last_opened_at = Some(Instant::now());
    }

    fn reset(&mut self) {
        self.window.fill(false);
        self.pos = 0;
        self.consecutive_successes = 0;
        self.state = CircuitState::Closed;
    }

    fn failed_fraction(&self) -> f64 {
        let fails = self.window.iter().filter(|failed| **failed).count();
        fails as f64 / self.window.len() as f64
    }
}

/// Failure tracker for one downstream dependency.
///
/// Created once at client construction and shared by every request to that
/// dependency for the lifetime of the process. All bookkeeping is serialized
/// by one lock per instance; the lock is never held while the wrapped future
/// runs, so a slow downstream call does not block state checks for other
/// in-flight requests.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: RwLock<BreakerState>,
    counters: Counters,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        debug!("creating circuit breaker: {name}");
        let state = RwLock::new(BreakerState::new(config.window_size));

        Self {
            name,
            config,
            state,
            counters: Counters::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state of the breaker
    pub async fn state(&self) -> CircuitState {
        self.state.read().await.state
    }

    /// Counter snapshot
    pub fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            successes: self.counters.successes.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            opened_count: self.counters.opened_count.load(Ordering::Relaxed),
            closed_count: self.counters.closed_count.load(Ordering::Relaxed),
            rejected_count: self.counters.rejected_count.load(Ordering::Relaxed),
        }
    }

    /// Run `f` through the breaker.
    ///
    /// Open breakers reject immediately with [`CircuitBreakerError::Open`]
    /// unless the open timeout has elapsed, in which case the call is
    /// admitted as a half-open probe. Errors from `f` propagate unchanged
    /// inside [`CircuitBreakerError::ExecutionFailed`] after bookkeeping.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.admit().await?;

        // Lock released: the wrapped call must not serialize other requests.
        let result = f().await;

        self.record(result.is_err()).await;
        result.map_err(CircuitBreakerError::ExecutionFailed)
    }

    /// Reset to Closed with an all-success window and zeroed counters.
    /// Idempotent, safe from any state.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        info!("manually resetting circuit breaker: {}", self.name);
        state.reset();
    }

    async fn admit<E>(&self) -> Result<(), CircuitBreakerError<E>> {
        let mut state = self.state.write().await;

        if state.state != CircuitState::Open {
            return Ok(());
        }

        let elapsed = state
            .last_opened_at
            .map(|at| at.elapsed() > self.config.open_timeout)
            .unwrap_or(true);
        if elapsed {
            debug!("circuit breaker {} transitioning to half-open", self.name);
            state.state = CircuitState::HalfOpen;
            state.consecutive_successes = 0;
            Ok(())
        } else {
            self.counters.rejected_count.fetch_add(1, Ordering::Relaxed);
            Err(CircuitBreakerError::Open {
                name: self.name.clone(),
            })
        }
    }

    async fn record(&self, failed: bool) {
        if failed {
            self.counters.failures.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.successes.fetch_add(1, Ordering::Relaxed);
        }

        let mut state = self.state.write().await;
        let pos = state.pos;
        state.window[pos] = failed;
        state.pos = (pos + 1) % self.config.window_size;

        match state.state {
            CircuitState::HalfOpen => {
                if failed {
                    warn!(
                        "circuit breaker {} reopening: probe failed",
                        self.name
                    );
                    state.open();
                    self.counters.opened_count.fetch_add(1, Ordering::Relaxed);
                } else {
                    state.consecutive_successes += 1;
                    if state.consecutive_successes > self.config.recovery_requests {
                        info!(
                            "circuit breaker {} closing after {} successes",
                            self.name, state.consecutive_successes
                        );
                        state.reset();
                        self.counters.closed_count.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            CircuitState::Closed => {
                if state.failed_fraction() >= self.config.failure_threshold {
                    warn!(
                        "circuit breaker {} opening: failure ratio reached {:.2}",
                        self.name, self.config.failure_threshold
                    );
                    state.open();
                    self.counters.opened_count.fetch_add(1, Ordering::Relaxed);
                }
            }
            // Opened by a concurrent request while this call was in flight;
            // the slot write above is the only bookkeeping left to do.
            CircuitState::Open => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    fn config(window_size: usize, failure_threshold: f64) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            window_size,
            failure_threshold,
            open_timeout: Duration::from_secs(1),
            recovery_requests: 2,
        }
    }

    async fn fail(breaker: &CircuitBreaker) -> Result<(), CircuitBreakerError<&'static str>> {
        breaker.call(|| async { Err::<(), _>("boom") }).await.map(|_| ())
    }

    async fn succeed(breaker: &CircuitBreaker) -> Result<i32, CircuitBreakerError<&'static str>> {
        breaker.call(|| async { Ok::<_, &'static str>(42) }).await
    }

    #[tokio::test]
    async fn starts_closed() {
        let breaker = CircuitBreaker::new("test", CircuitBreakerConfig::default());
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn successes_keep_circuit_closed() {
        let breaker = CircuitBreaker::new("test", config(10, 0.2));
        for _ in 0..50 {
            assert!(succeed(&breaker).await.is_ok());
            assert_eq!(breaker.state().await, CircuitState::Closed);
        }
        let stats = breaker.stats();
        assert_eq!(stats.successes, 50);
        assert_eq!(stats.failures, 0);
    }

    #[tokio::test]
    async fn opens_exactly_at_threshold_fraction() {
        // threshold 0.3 over a window of 10: opens on the 3rd failure, not
        // the 2nd, even while most slots have never been written.
        let breaker = CircuitBreaker::new("test", config(10, 0.3));

        assert!(fail(&breaker).await.is_err());
        assert_eq!(breaker.state().await, CircuitState::Closed);
        assert!(fail(&breaker).await.is_err());
        assert_eq!(breaker.state().await, CircuitState::Closed);
        assert!(fail(&breaker).await.is_err());
        assert_eq!(breaker.state().await, CircuitState::Open);
        assert_eq!(breaker.stats().opened_count, 1);
    }

    #[tokio::test]
    async fn unwritten_slots_count_as_successes() {
        // One failure in a window of 100 is 1%, far below 20%.
        let breaker = CircuitBreaker::new("test", config(100, 0.2));
        assert!(fail(&breaker).await.is_err());
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn window_wraps_and_forgets_old_failures() {
        let breaker = CircuitBreaker::new("test", config(4, 0.5));
        // Two failures in a window of 4 would open it; interleave successes
        // so the wrap overwrites the failure before the ratio is reached.
        assert!(fail(&breaker).await.is_err());
        for _ in 0..3 {
            assert!(succeed(&breaker).await.is_ok());
        }
        // Window is now all-success again; one more failure stays closed.
        assert!(fail(&breaker).await.is_err());
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn open_rejects_without_invoking_until_timeout() {
        let breaker = CircuitBreaker::new("test", config(2, 0.5));
        assert!(fail(&breaker).await.is_err());
        assert_eq!(breaker.state().await, CircuitState::Open);

        let mut invoked = false;
        let result = breaker
            .call(|| {
                invoked = true;
                async { Ok::<_, &'static str>(1) }
            })
            .await;
        assert!(matches!(result, Err(CircuitBreakerError::Open { .. })));
        assert!(!invoked);
        assert!(breaker.stats().rejected_count > 0);

        advance(Duration::from_millis(1001)).await;

        // First call after the timeout runs as a half-open probe.
        let mut probed = false;
        let result = breaker
            .call(|| {
                probed = true;
                async { Ok::<_, &'static str>(1) }
            })
            .await;
        assert!(result.is_ok());
        assert!(probed);
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_failure_reopens_and_restamps() {
        let breaker = CircuitBreaker::new("test", config(2, 0.5));
        assert!(fail(&breaker).await.is_err());
        assert_eq!(breaker.state().await, CircuitState::Open);

        advance(Duration::from_millis(1001)).await;
        assert!(fail(&breaker).await.is_err());
        assert_eq!(breaker.state().await, CircuitState::Open);
        assert_eq!(breaker.stats().opened_count, 2);

        // last_opened_at was re-stamped: still rejecting before a fresh
        // timeout has elapsed.
        advance(Duration::from_millis(500)).await;
        let result = succeed(&breaker).await;
        assert!(matches!(result, Err(CircuitBreakerError::Open { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_closes_after_recovery_requests_plus_one() {
        let breaker = CircuitBreaker::new("test", config(2, 0.5));
        assert!(fail(&breaker).await.is_err());
        advance(Duration::from_millis(1001)).await;

        // recovery_requests = 2: two successes are not enough.
        assert!(succeed(&breaker).await.is_ok());
        assert!(succeed(&breaker).await.is_ok());
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);

        assert!(succeed(&breaker).await.is_ok());
        assert_eq!(breaker.state().await, CircuitState::Closed);
        assert_eq!(breaker.stats().closed_count, 1);

        // Window was cleared on close: the old failure is gone, so a single
        // new failure over window 2 at 0.5 opens again (1/2 >= 0.5).
        assert!(fail(&breaker).await.is_err());
        assert_eq!(breaker.state().await, CircuitState::Open);
    }

    #[tokio::test]
    async fn wrapped_error_propagates_unchanged() {
        let breaker = CircuitBreaker::new("test", CircuitBreakerConfig::default());
        let result = breaker.call(|| async { Err::<(), _>("original") }).await;
        match result {
            Err(CircuitBreakerError::ExecutionFailed(e)) => assert_eq!(e, "original"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn reset_is_idempotent_from_any_state() {
        let breaker = CircuitBreaker::new("test", config(2, 0.5));
        assert!(fail(&breaker).await.is_err());
        assert_eq!(breaker.state().await, CircuitState::Open);

        breaker.reset().await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
        breaker.reset().await;
        assert_eq!(breaker.state().await, CircuitState::Closed);

        // All-success window after reset: a single failure over window 2 is
        // judged against a clean slate.
        assert!(succeed(&breaker).await.is_ok());
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn lock_not_held_while_wrapped_call_runs() {
        use std::sync::Arc;

        let breaker = Arc::new(CircuitBreaker::new("test", CircuitBreakerConfig::default()));
        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let slow = {
            let breaker = Arc::clone(&breaker);
            tokio::spawn(async move {
                breaker
                    .call(|| async move {
                        let _ = started_tx.send(());
                        let _ = release_rx.await;
                        Ok::<_, &'static str>(())
                    })
                    .await
            })
        };

        started_rx.await.unwrap();
        // A state check must not block behind the in-flight call.
        assert_eq!(breaker.state().await, CircuitState::Closed);
        assert!(succeed(&breaker).await.is_ok());

        let _ = release_tx.send(());
        slow.await.unwrap().unwrap();
    }
}
