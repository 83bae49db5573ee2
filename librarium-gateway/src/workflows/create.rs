//! Create-reservation workflow: fork-join fetch, tentative create,
//! availability decrement with synchronous rollback on failure.

use std::sync::Arc;

use chrono::Utc;
use librarium_core::{AvailabilityRequest, ReservationUid, Username};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use super::{fork_join, ReservationWorkflows};
use crate::dto::{CreateReservationRequest, CreateReservationResponse, NewReservation};
use crate::error::{GatewayError, GatewayResult};
use crate::queue::{AuditEvent, Direction};

impl ReservationWorkflows {
    pub async fn create_reservation(
        &self,
        user: &Username,
        req: CreateReservationRequest,
    ) -> GatewayResult<CreateReservationResponse> {
        // Fork: library, book and rating fetches share one token; the first
        // failure cancels the others and aborts before anything is written.
        let token = CancellationToken::new();

        let library_task = {
            let client = Arc::clone(&self.library);
            let library_uid = req.library_uid;
            fork_join::spawn_guarded(&token, async move {
                client
                    .breaker()
                    .call(|| client.get_library(library_uid))
                    .await
                    .map_err(GatewayError::from)
            })
        };

        let book_task = {
            let client = Arc::clone(&self.library);
            let library_uid = req.library_uid;
            let book_uid = req.book_uid;
            fork_join::spawn_guarded(&token, async move {
                client
                    .breaker()
                    .call(|| client.get_book(library_uid, book_uid))
                    .await
                    .map_err(GatewayError::from)
            })
        };

        let rating_task = {
            let client = Arc::clone(&self.rating);
            let user = user.clone();
            fork_join::spawn_guarded(&token, async move {
                client
                    .breaker()
                    .call(|| client.get_rating(&user))
                    .await
                    .map_err(GatewayError::from)
            })
        };

        let (library, book, rating) =
            fork_join::join3(library_task, book_task, rating_task).await?;

        // Tentative create. The reservation service checks the stars
        // allowance and answers with a precondition rejection when the user
        // already holds `stars` active reservations.
        let new_reservation = NewReservation {
            library_uid: req.library_uid,
            book_uid: req.book_uid,
            till_date: req.till_date,
            stars: rating.stars,
        };
        let reservation = self
            .reservation
            .breaker()
            .call(|| self.reservation.create_reservation(user, &new_reservation))
            .await
            .map_err(GatewayError::from)?;

        // The reservation is not "real" until the copy is taken off the
        // shelf; a failed decrement deletes it again.
        let availability = AvailabilityRequest {
            library_id: library.id,
            book_id: book.id,
            returning: false,
        };
        if let Err(primary) = self
            .library
            .breaker()
            .call(|| self.library.adjust_availability(&availability))
            .await
            .map_err(GatewayError::from)
        {
            return Err(self
                .rollback_reservation(reservation.reservation_uid, primary)
                .await);
        }

        self.emit_audit(AuditEvent {
            timestamp: Utc::now(),
            username: user.clone(),
            reservation_uid: reservation.reservation_uid,
            library_uid: library.library.library_uid,
            book_uid: book.book.book_uid,
            stars: Some(rating.stars),
            direction: Direction::Up,
        })
        .await;

        Ok(CreateReservationResponse {
            reservation_uid: reservation.reservation_uid,
            status: reservation.status,
            start_date: reservation.start_date,
            till_date: reservation.till_date,
            library: library.library,
            book: book.book,
            rating,
        })
    }

    async fn rollback_reservation(
        &self,
        reservation_uid: ReservationUid,
        primary: GatewayError,
    ) -> GatewayError {
        warn!(%reservation_uid, error = %primary, "availability decrement failed, rolling reservation back");

        match self
            .reservation
            .breaker()
            .call(|| self.reservation.cancel_reservation(reservation_uid))
            .await
        {
            Ok(()) => primary,
            Err(compensation) => {
                let compensation = GatewayError::from(compensation);
                error!(%reservation_uid, error = %compensation, "rollback failed, reservation left inconsistent");
                GatewayError::CompensationFailed {
                    source: Box::new(primary),
                    compensation: Box::new(compensation),
                }
            }
        }
    }
}
