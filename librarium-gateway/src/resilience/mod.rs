//! Resilience layer for downstream fan-out.
//!
//! One [`CircuitBreaker`] instance exists per downstream dependency, owned by
//! that dependency's client wrapper and shared by every in-flight request.
//! The breaker tracks a fixed-size window of recent call outcomes and fails
//! fast while the dependency is considered down.

pub mod circuit_breaker;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerStats, CircuitState,
};
