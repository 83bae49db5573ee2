//! Downstream service clients.
//!
//! Each client wraps one remote service and owns that dependency's
//! [`CircuitBreaker`], exposed through `breaker()` so the workflows always
//! call through it. The traits are the seam the workflows are tested
//! against.

pub mod http;
pub mod library;
pub mod rating;
pub mod reservation;
pub mod stats;

use async_trait::async_trait;
use librarium_core::{
    AvailabilityRequest, BookInfo, BookUid, Library, LibraryInfo, LibraryUid, Rating, Reservation,
    ReservationRecord, ReservationUid, ReturnOutcome, Username,
};

use crate::dto::{NewReservation, ReturnRequest, StatsInfo};
use crate::error::GatewayResult;
use crate::resilience::CircuitBreaker;

pub use http::{HttpTransport, DOWNSTREAM_TIMEOUT, X_USER_NAME};
pub use library::LibraryClient;
pub use rating::RatingClient;
pub use reservation::ReservationClient;
pub use stats::StatsClient;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryApi: Send + Sync {
    fn breaker(&self) -> &CircuitBreaker;

    async fn get_libraries(&self, city: &str) -> GatewayResult<Vec<Library>>;

    async fn get_library(&self, library_uid: LibraryUid) -> GatewayResult<LibraryInfo>;

    async fn get_books(
        &self,
        library_uid: LibraryUid,
        show_all: bool,
    ) -> GatewayResult<Vec<BookInfo>>;

    async fn get_book(&self, library_uid: LibraryUid, book_uid: BookUid)
        -> GatewayResult<BookInfo>;

    /// Decrement (`returning = false`) or increment (`returning = true`) the
    /// available-count of a book at a library.
    async fn adjust_availability(&self, req: &AvailabilityRequest) -> GatewayResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingApi: Send + Sync {
    fn breaker(&self) -> &CircuitBreaker;

    async fn get_rating(&self, user: &Username) -> GatewayResult<Rating>;

    async fn adjust_rating(&self, user: &Username, delta_stars: i32) -> GatewayResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationApi: Send + Sync {
    fn breaker(&self) -> &CircuitBreaker;

    async fn get_reservations(&self, user: &Username) -> GatewayResult<Vec<ReservationRecord>>;

    /// Create a tentative reservation (status = Rented). The reservation
    /// service enforces the stars allowance and rejects with a precondition
    /// error when the user already holds `stars` active reservations.
    async fn create_reservation(
        &self,
        user: &Username,
        req: &NewReservation,
    ) -> GatewayResult<Reservation>;

    /// Rollback delete for a reservation whose side effects never landed.
    async fn cancel_reservation(&self, reservation_uid: ReservationUid) -> GatewayResult<()>;

    /// Authoritative Returned/Expired transition. Once committed it is not
    /// rolled back by later failures.
    async fn return_reservation(
        &self,
        user: &Username,
        reservation_uid: ReservationUid,
        req: &ReturnRequest,
    ) -> GatewayResult<ReturnOutcome>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsApi: Send + Sync {
    fn breaker(&self) -> &CircuitBreaker;

    async fn get_stats(&self, user: &Username) -> GatewayResult<StatsInfo>;
}
