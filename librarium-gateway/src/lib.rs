//! Gateway for the library-reservation platform.
//!
//! Fans each inbound request out to the backing services (library catalog,
//! rating, reservation, stats), each behind its own circuit breaker, and
//! aggregates the results. Partial failures are compensated (create) or
//! deferred to the queue (return) instead of leaking half-done state.

pub mod clients;
pub mod dto;
pub mod error;
pub mod queue;
pub mod resilience;
pub mod routes;
pub mod workflows;

pub use error::{GatewayError, GatewayResult};
pub use routes::{routes, AppState};
pub use workflows::ReservationWorkflows;
