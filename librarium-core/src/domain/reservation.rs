use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{BookUid, LibraryUid, ReservationUid};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Rented,
    Returned,
    Expired,
}

impl ReservationStatus {
    /// Only rented reservations count against the user's stars allowance.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Rented)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// The authoritative transition taken when a book comes back: past-due
    /// returns land in Expired, everything else in Returned.
    pub fn on_return(till_date: NaiveDate, returned_at: NaiveDate) -> Self {
        if returned_at > till_date {
            ReservationStatus::Expired
        } else {
            ReservationStatus::Returned
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub reservation_uid: ReservationUid,
    pub status: ReservationStatus,
    pub start_date: DateTime<Utc>,
    pub till_date: DateTime<Utc>,
}

/// Reservation row as listed by the reservation service, carrying the
/// library/book keys needed to resolve the full view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRecord {
    pub reservation_uid: ReservationUid,
    pub library_uid: LibraryUid,
    pub book_uid: BookUid,
    pub status: ReservationStatus,
    pub start_date: DateTime<Utc>,
    pub till_date: DateTime<Utc>,
}

/// What the reservation service returns from the return transition: the keys
/// of the affected book so availability and rating side effects can run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReturnOutcome {
    pub library_uid: LibraryUid,
    pub book_uid: BookUid,
}
