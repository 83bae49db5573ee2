use async_trait::async_trait;
use axum::http::StatusCode;
use librarium_core::{Reservation, ReservationRecord, ReservationUid, ReturnOutcome, Username};

use super::http::HttpTransport;
use super::ReservationApi;
use crate::dto::{NewReservation, ReturnRequest};
use crate::error::{GatewayError, GatewayResult};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};

/// Client for the reservation service.
pub struct ReservationClient {
    transport: HttpTransport,
    breaker: CircuitBreaker,
}

impl ReservationClient {
    pub fn new(
        base_url: impl Into<String>,
        breaker_config: CircuitBreakerConfig,
    ) -> GatewayResult<Self> {
        Ok(Self {
            transport: HttpTransport::new(base_url, StatusCode::BAD_REQUEST)?,
            breaker: CircuitBreaker::new("reservation", breaker_config),
        })
    }
}

#[async_trait]
impl ReservationApi for ReservationClient {
    fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn get_reservations(&self, user: &Username) -> GatewayResult<Vec<ReservationRecord>> {
        self.transport
            .get_json("/api/v1/reservations", Some(user))
            .await
    }

    async fn create_reservation(
        &self,
        user: &Username,
        req: &NewReservation,
    ) -> GatewayResult<Reservation> {
        self.transport
            .post_json("/api/v1/reservations", Some(user), req)
            .await
            .map_err(reword_stars_rejection)
    }

    async fn cancel_reservation(&self, reservation_uid: ReservationUid) -> GatewayResult<()> {
        self.transport
            .delete(&format!("/api/v1/reservations/{reservation_uid}"), None)
            .await
    }

    async fn return_reservation(
        &self,
        user: &Username,
        reservation_uid: ReservationUid,
        req: &ReturnRequest,
    ) -> GatewayResult<ReturnOutcome> {
        self.transport
            .post_json(
                &format!("/api/v1/reservations/{reservation_uid}/return"),
                Some(user),
                req,
            )
            .await
    }
}

/// The reservation service answers 400 with a "stars" message when the user
/// has exhausted their allowance. Surface that as a precondition rejection
/// rather than a generic downstream failure.
fn reword_stars_rejection(err: GatewayError) -> GatewayError {
    match err {
        GatewayError::Downstream { status, message }
            if status == StatusCode::BAD_REQUEST && message.contains("stars") =>
        {
            GatewayError::Precondition(message)
        }
        other => other,
    }
}
