//! Request/response shapes at the gateway boundary and between the gateway
//! and the reservation service.

use chrono::{DateTime, NaiveDate, Utc};
use librarium_core::{
    Book, BookCondition, BookUid, Library, LibraryUid, Rating, Reservation, ReservationStatus,
    ReservationUid, Username,
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Deserialize)]
pub struct LibrariesQuery {
    pub city: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooksQuery {
    #[serde(default)]
    pub show_all: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub library_uid: LibraryUid,
    pub book_uid: BookUid,
    #[validate(custom(function = "validate_till_date"))]
    pub till_date: NaiveDate,
}

fn validate_till_date(till_date: &NaiveDate) -> Result<(), ValidationError> {
    if *till_date < Utc::now().date_naive() {
        return Err(ValidationError::new("till_date_in_past"));
    }
    Ok(())
}

/// Create request forwarded to the reservation service, with the user's
/// stars injected so the service can enforce the allowance precondition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub library_uid: LibraryUid,
    pub book_uid: BookUid,
    pub till_date: NaiveDate,
    pub stars: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationResponse {
    pub reservation_uid: ReservationUid,
    pub status: ReservationStatus,
    pub start_date: DateTime<Utc>,
    pub till_date: DateTime<Utc>,
    pub library: Library,
    pub book: Book,
    pub rating: Rating,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub condition: BookCondition,
    pub date: NaiveDate,
}

/// Reservation joined with its resolved library and book cards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationView {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub library: Library,
    pub book: Book,
}

/// Deferred rating adjustment handed to the queue when the rating service is
/// unavailable during a return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RatingMessage {
    pub username: Username,
    pub stars: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsInfo {
    pub reservations_made: i64,
    pub books_returned: i64,
    pub active_users: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    #[test]
    fn till_date_must_not_be_past() {
        let today = Utc::now().date_naive();
        let req = CreateReservationRequest {
            library_uid: LibraryUid::new(),
            book_uid: BookUid::new(),
            till_date: today.checked_add_days(Days::new(7)).unwrap(),
        };
        assert!(req.validate().is_ok());

        let stale = CreateReservationRequest {
            till_date: today.checked_sub_days(Days::new(1)).unwrap(),
            ..req
        };
        assert!(stale.validate().is_err());
    }
}
