use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::resilience::circuit_breaker::CircuitBreakerError;

/// Error taxonomy of the fan-out layer. HTTP status codes are the
/// classification channel between the gateway and its downstreams: 503 means
/// "dependency unavailable" and feeds the deferred-retry path, 4xx is a
/// caller/business error that must never trigger compensation.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The dependency's circuit breaker is open; the call was never made.
    #[error("{dependency} unavailable: circuit open")]
    CircuitOpen { dependency: String },

    /// A downstream call completed with a non-2xx result (or failed at the
    /// transport layer); carries the origin status code.
    #[error("downstream error ({status}): {message}")]
    Downstream { status: StatusCode, message: String },

    /// Business-rule rejection (e.g. insufficient stars). Maps to 4xx and
    /// never triggers compensation.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A compensating action failed after a primary failure. The primary
    /// error stays the caller-visible one; the rollback failure rides along
    /// and is logged, never silently swallowed.
    #[error("{source} (compensation also failed: {compensation})")]
    CompensationFailed {
        source: Box<GatewayError>,
        compensation: Box<GatewayError>,
    },

    /// A fork-join task observed the shared token before producing a result.
    /// Never surfaces to callers while a sibling holds the real error.
    #[error("request cancelled")]
    Cancelled,

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::CircuitOpen { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Downstream { status, .. } => *status,
            GatewayError::Precondition(_) => StatusCode::BAD_REQUEST,
            GatewayError::CompensationFailed { source, .. } => source.status_code(),
            GatewayError::Cancelled => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for errors that mean "the dependency cannot take this write
    /// right now": an open breaker or a downstream 503. These take the
    /// deferred-retry path in the return workflow instead of failing the
    /// request.
    pub fn is_unavailable(&self) -> bool {
        match self {
            GatewayError::CircuitOpen { .. } => true,
            GatewayError::Downstream { status, .. } => {
                *status == StatusCode::SERVICE_UNAVAILABLE
            }
            _ => false,
        }
    }

    /// True for caller/business errors that must never trigger compensation.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<ValidationErrors> for GatewayError {
    fn from(errors: ValidationErrors) -> Self {
        GatewayError::Validation(format!("validation failed: {errors}"))
    }
}

impl From<CircuitBreakerError<GatewayError>> for GatewayError {
    fn from(err: CircuitBreakerError<GatewayError>) -> Self {
        match err {
            CircuitBreakerError::Open { name } => GatewayError::CircuitOpen { dependency: name },
            CircuitBreakerError::ExecutionFailed(e) => e,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            GatewayError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
            }
            GatewayError::CompensationFailed {
                source,
                compensation,
            } => {
                tracing::error!(%source, %compensation, "compensation failed");
            }
            _ => {}
        }

        // Only a message string ever crosses the boundary.
        let body = json!({ "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn downstream_status_propagates() {
        let err = GatewayError::Downstream {
            status: StatusCode::CONFLICT,
            message: "book already rented".into(),
        };
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(!err.is_unavailable());
    }

    #[test]
    fn circuit_open_is_unavailable() {
        let err = GatewayError::CircuitOpen {
            dependency: "library".into(),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.is_unavailable());
    }

    #[rstest]
    #[case(StatusCode::SERVICE_UNAVAILABLE, true)]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, false)]
    #[case(StatusCode::BAD_REQUEST, false)]
    #[case(StatusCode::NOT_FOUND, false)]
    fn unavailability_follows_downstream_status(
        #[case] status: StatusCode,
        #[case] unavailable: bool,
    ) {
        let err = GatewayError::Downstream {
            status,
            message: "down".into(),
        };
        assert_eq!(err.is_unavailable(), unavailable);
    }

    #[test]
    fn compensation_failure_keeps_original_status() {
        let original = GatewayError::Downstream {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "availability decrement failed".into(),
        };
        let err = GatewayError::CompensationFailed {
            source: Box::new(original),
            compensation: Box::new(GatewayError::CircuitOpen {
                dependency: "reservation".into(),
            }),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let rendered = err.to_string();
        assert!(rendered.contains("availability decrement failed"));
        assert!(rendered.contains("compensation also failed"));
    }

    #[test]
    fn precondition_is_client_error() {
        let err = GatewayError::Precondition("stars <= rented books".into());
        assert!(err.is_client_error());
        assert!(!err.is_unavailable());
    }
}
