//! Aggregation workflows the gateway runs per inbound request.
//!
//! Each workflow fans out to the downstream services through their circuit
//! breakers, joins the results, and decides commit / rollback / defer on
//! partial failure. The clients, enqueuer and audit log are injected as
//! trait objects; the workflows own no state beyond them.

pub(crate) mod fork_join;

mod create;
mod list;
mod return_flow;

use std::sync::Arc;

use librarium_core::{BookInfo, Library, LibraryUid, Rating, Username};
use serde::Serialize;
use tracing::warn;

use crate::clients::{LibraryApi, RatingApi, ReservationApi, StatsApi};
use crate::dto::StatsInfo;
use crate::error::{GatewayError, GatewayResult};
use crate::queue::{AuditEvent, AuditLog, Enqueuer};

pub struct ReservationWorkflows {
    library: Arc<dyn LibraryApi>,
    rating: Arc<dyn RatingApi>,
    reservation: Arc<dyn ReservationApi>,
    stats: Arc<dyn StatsApi>,
    enqueuer: Arc<dyn Enqueuer>,
    audit: Arc<dyn AuditLog>,
}

impl ReservationWorkflows {
    pub fn new(
        library: Arc<dyn LibraryApi>,
        rating: Arc<dyn RatingApi>,
        reservation: Arc<dyn ReservationApi>,
        stats: Arc<dyn StatsApi>,
        enqueuer: Arc<dyn Enqueuer>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            library,
            rating,
            reservation,
            stats,
            enqueuer,
            audit,
        }
    }

    pub async fn get_libraries(&self, city: &str) -> GatewayResult<Vec<Library>> {
        self.library
            .breaker()
            .call(|| self.library.get_libraries(city))
            .await
            .map_err(GatewayError::from)
    }

    pub async fn get_books(
        &self,
        library_uid: LibraryUid,
        show_all: bool,
    ) -> GatewayResult<Vec<BookInfo>> {
        self.library
            .breaker()
            .call(|| self.library.get_books(library_uid, show_all))
            .await
            .map_err(GatewayError::from)
    }

    pub async fn get_rating(&self, user: &Username) -> GatewayResult<Rating> {
        self.rating
            .breaker()
            .call(|| self.rating.get_rating(user))
            .await
            .map_err(GatewayError::from)
    }

    pub async fn get_stats(&self, user: &Username) -> GatewayResult<StatsInfo> {
        self.stats
            .breaker()
            .call(|| self.stats.get_stats(user))
            .await
            .map_err(GatewayError::from)
    }

    /// Hand a payload to the deferred-retry queue. Best-effort: a failed
    /// hand-off is logged and the request proceeds.
    pub(crate) async fn defer<T: Serialize + Sync>(&self, topic: &str, payload: &T) {
        let payload = match serde_json::to_value(payload) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(topic, error = %err, "deferred payload did not serialize");
                return;
            }
        };
        if let Err(err) = self.enqueuer.enqueue(topic, payload).await {
            warn!(topic, error = %err, "deferred enqueue failed");
        }
    }

    /// Emit an audit event. Failure to emit must not fail the request.
    pub(crate) async fn emit_audit(&self, event: AuditEvent) {
        if let Err(err) = self.audit.log(event).await {
            warn!(error = %err, "audit event emit failed");
        }
    }
}
