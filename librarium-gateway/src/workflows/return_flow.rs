//! Return-reservation workflow: authoritative state transition first, then
//! side effects that are deferred to the queue when their dependency is
//! unavailable.

use std::sync::Arc;

use chrono::Utc;
use librarium_core::{rating::return_delta, AvailabilityRequest, ReservationUid, Username};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{fork_join, ReservationWorkflows};
use crate::dto::{RatingMessage, ReturnRequest};
use crate::error::{GatewayError, GatewayResult};
use crate::queue::{topics, AuditEvent, Direction};

impl ReservationWorkflows {
    pub async fn return_reservation(
        &self,
        user: &Username,
        reservation_uid: ReservationUid,
        req: ReturnRequest,
    ) -> GatewayResult<()> {
        // The Returned/Expired transition commits first and is never rolled
        // back; everything after is a side effect that either lands now or
        // is replayed from the queue later.
        let outcome = self
            .reservation
            .breaker()
            .call(|| self.reservation.return_reservation(user, reservation_uid, &req))
            .await
            .map_err(GatewayError::from)?;

        let token = CancellationToken::new();

        let library_task = {
            let client = Arc::clone(&self.library);
            let library_uid = outcome.library_uid;
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
            let library_uid = outcome.library_uid;
            let book_uid = outcome.book_uid;
            fork_join::spawn_guarded(&token, async move {
                client
                    .breaker()
                    .call(|| client.get_book(library_uid, book_uid))
                    .await
                    .map_err(GatewayError::from)
            })
        };

        let (library, book) = fork_join::join2(library_task, book_task).await?;

        let availability = AvailabilityRequest {
            library_id: library.id,
            book_id: book.id,
            returning: true,
        };
        match self
            .library
            .breaker()
            .call(|| self.library.adjust_availability(&availability))
            .await
            .map_err(GatewayError::from)
        {
            Ok(()) => {}
            Err(err) if err.is_unavailable() => {
                info!(error = %err, "library unavailable, deferring availability increment");
                self.defer(topics::LIBRARY_AVAILABILITY, &availability).await;
            }
            Err(err) => return Err(err),
        }

        let delta = return_delta(book.condition == req.condition);
        match self
            .rating
            .breaker()
            .call(|| self.rating.adjust_rating(user, delta))
            .await
            .map_err(GatewayError::from)
        {
            Ok(()) => {}
            Err(err) if err.is_unavailable() => {
                info!(error = %err, "rating unavailable, deferring rating adjustment");
                let message = RatingMessage {
                    username: user.clone(),
                    stars: delta,
                };
                self.defer(topics::USER_RATING, &message).await;
            }
            Err(err) => return Err(err),
        }

        self.emit_audit(AuditEvent {
            timestamp: Utc::now(),
            username: user.clone(),
            reservation_uid,
            library_uid: outcome.library_uid,
            book_uid: outcome.book_uid,
            stars: Some(delta),
            direction: Direction::Down,
        })
        .await;

        Ok(())
    }
}
