//! Reservation listing: resolve every record's library and book cards
//! concurrently and join them into full views.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use librarium_core::{Book, Library, Username};

use super::{fork_join, ReservationWorkflows};
use crate::dto::ReservationView;
use crate::error::{GatewayError, GatewayResult};

impl ReservationWorkflows {
    pub async fn get_reservations(&self, user: &Username) -> GatewayResult<Vec<ReservationView>> {
        let records = self
            .reservation
            .breaker()
            .call(|| self.reservation.get_reservations(user))
            .await
            .map_err(GatewayError::from)?;

        if records.is_empty() {
            return Ok(Vec::new());
        }

        // Two arms over the same record list: one resolves libraries, the
        // other books. Results stay index-aligned with the records.
        let token = CancellationToken::new();

        let libraries_task = {
            let client = Arc::clone(&self.library);
            let keys: Vec<_> = records.iter().map(|r| r.library_uid).collect();
            fork_join::spawn_guarded(&token, async move {
                let mut libraries = Vec::with_capacity(keys.len());
                for library_uid in keys {
                    let info = client
                        .breaker()
                        .call(|| client.get_library(library_uid))
                        .await
                        .map_err(GatewayError::from)?;
                    libraries.push(info.library);
                }
                Ok::<Vec<Library>, GatewayError>(libraries)
            })
        };

        let books_task = {
            let client = Arc::clone(&self.library);
            let keys: Vec<_> = records.iter().map(|r| (r.library_uid, r.book_uid)).collect();
            fork_join::spawn_guarded(&token, async move {
                let mut books = Vec::with_capacity(keys.len());
                for (library_uid, book_uid) in keys {
                    let info = client
                        .breaker()
                        .call(|| client.get_book(library_uid, book_uid))
                        .await
                        .map_err(GatewayError::from)?;
                    books.push(info.book);
                }
                Ok::<Vec<Book>, GatewayError>(books)
            })
        };

        let (libraries, books) = fork_join::join2(libraries_task, books_task).await?;

        let views = records
            .into_iter()
            .zip(libraries)
            .zip(books)
            .map(|((record, library), book)| ReservationView {
                reservation: librarium_core::Reservation {
                    reservation_uid: record.reservation_uid,
                    status: record.status,
                    start_date: record.start_date,
                    till_date: record.till_date,
                },
                library,
                book,
            })
            .collect();

        Ok(views)
    }
}
