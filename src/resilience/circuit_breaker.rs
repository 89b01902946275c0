use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Seconds the circuit stays open before one trial call is let through
    pub recovery_timeout_secs: u64,
}

impl CircuitBreakerConfig {
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_secs)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Outcome of a guarded call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallError<E> {
    /// Rejected without invoking the operation
    #[error("circuit breaker is open")]
    CircuitOpen,
    #[error("{0}")]
    Failed(E),
}

/// Point-in-time view of the breaker, safe to serialize for status output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub opened_at: Option<DateTime<Utc>>,
    pub total_failures: u64,
    pub total_rejections: u64,
}

/// Failure-count circuit breaker guarding one operation.
///
/// ```text
/// Closed --threshold failures--> Open --recovery timeout--> HalfOpen
///   ^                              ^                           |
///   |                              +-------trial fails---------+
///   +------------------------trial succeeds--------------------+
/// ```
///
/// State, counter and timestamp live behind one mutex so concurrent outcomes
/// never lose updates. The lock is never held across an await, so it is a
/// plain blocking mutex that the admission guard can also take on drop.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

#[derive(Debug)]
struct BreakerState {
    circuit: Circuit,
    failure_count: u32,
    total_failures: u64,
    total_rejections: u64,
}

#[derive(Debug, Clone, Copy)]
enum Circuit {
    Closed,
    Open { opened_at: DateTime<Utc> },
    /// The single trial call is in flight
    HalfOpen { opened_at: DateTime<Utc> },
}

/// Admission granted to one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Permit {
    Normal,
    Trial,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BreakerState {
                circuit: Circuit::Closed,
                failure_count: 0,
                total_failures: 0,
                total_rejections: 0,
            }),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Run `operation` under the breaker.
    ///
    /// Every `Err` from the operation counts as a failure. A half-open trial
    /// that never reports back (its future dropped, or the operation
    /// panicked) reopens the circuit.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let admission = self.acquire().ok_or(CallError::CircuitOpen)?;

        match operation().await {
            Ok(value) => {
                admission.succeed();
                Ok(value)
            }
            Err(error) => {
                admission.fail();
                Err(CallError::Failed(error))
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self) -> Option<Admission<'_>> {
        let mut state = self.lock();

        let permit = match state.circuit {
            Circuit::Closed => Permit::Normal,
            Circuit::Open { opened_at } if self.recovery_elapsed(opened_at) => {
                info!("circuit breaker half-open, allowing trial call");
                state.circuit = Circuit::HalfOpen { opened_at };
                Permit::Trial
            }
            Circuit::Open { .. } | Circuit::HalfOpen { .. } => {
                state.total_rejections += 1;
                warn!("circuit breaker open, rejecting call");
                return None;
            }
        };

        Some(Admission {
            breaker: self,
            permit: Some(permit),
        })
    }

    fn record_success(&self, permit: Permit) {
        let mut state = self.lock();

        match (permit, state.circuit) {
            (Permit::Trial, _) => {
                info!("circuit breaker trial call succeeded, closing circuit");
                state.circuit = Circuit::Closed;
                state.failure_count = 0;
            }
            (Permit::Normal, Circuit::Closed) => state.failure_count = 0,
            // A call admitted before the circuit opened; the trial decides.
            (Permit::Normal, _) => {}
        }
    }

    fn record_failure(&self, permit: Permit) {
        let mut state = self.lock();
        state.total_failures += 1;

        match (permit, state.circuit) {
            (Permit::Trial, _) => {
                warn!("circuit breaker trial call failed, reopening circuit");
                state.failure_count += 1;
                state.circuit = Circuit::Open {
                    opened_at: Utc::now(),
                };
            }
            (Permit::Normal, Circuit::Closed) => {
                state.failure_count += 1;
                if state.failure_count >= self.config.failure_threshold {
                    warn!(
                        failures = state.failure_count,
                        recovery_timeout_secs = self.config.recovery_timeout_secs,
                        "circuit breaker opened"
                    );
                    state.circuit = Circuit::Open {
                        opened_at: Utc::now(),
                    };
                }
            }
            (Permit::Normal, _) => {}
        }
    }

    fn abandon_trial(&self) {
        let mut state = self.lock();
        warn!("circuit breaker trial call abandoned, reopening circuit");
        state.total_failures += 1;
        state.failure_count += 1;
        state.circuit = Circuit::Open {
            opened_at: Utc::now(),
        };
    }

    fn recovery_elapsed(&self, opened_at: DateTime<Utc>) -> bool {
        Utc::now()
            .signed_duration_since(opened_at)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= self.config.recovery_timeout())
    }

    pub async fn force_open(&self) {
        let mut state = self.lock();
        state.circuit = Circuit::Open {
            opened_at: Utc::now(),
        };
    }

    /// Close the circuit and clear the failure counter
    pub async fn reset(&self) {
        let mut state = self.lock();
        state.circuit = Circuit::Closed;
        state.failure_count = 0;
    }

    pub async fn state(&self) -> CircuitState {
        self.snapshot().await.state
    }

    pub async fn snapshot(&self) -> CircuitBreakerSnapshot {
        let state = self.lock();
        let (circuit_state, opened_at) = match state.circuit {
            Circuit::Closed => (CircuitState::Closed, None),
            Circuit::Open { opened_at } => (CircuitState::Open, Some(opened_at)),
            Circuit::HalfOpen { opened_at } => (CircuitState::HalfOpen, Some(opened_at)),
        };

        CircuitBreakerSnapshot {
            state: circuit_state,
            failure_count: state.failure_count,
            opened_at,
            total_failures: state.total_failures,
            total_rejections: state.total_rejections,
        }
    }
}

/// Admission held for the duration of one guarded call.
///
/// Dropping it without an outcome is a no-op for a normal call and a failed
/// trial for a half-open one.
struct Admission<'a> {
    breaker: &'a CircuitBreaker,
    permit: Option<Permit>,
}

impl Admission<'_> {
    fn succeed(mut self) {
        if let Some(permit) = self.permit.take() {
            self.breaker.record_success(permit);
        }
    }

    fn fail(mut self) {
        if let Some(permit) = self.permit.take() {
            self.breaker.record_failure(permit);
        }
    }
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        if self.permit.take() == Some(Permit::Trial) {
            self.breaker.abandon_trial();
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
