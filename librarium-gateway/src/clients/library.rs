use async_trait::async_trait;
use axum::http::StatusCode;
use librarium_core::{AvailabilityRequest, BookInfo, BookUid, Library, LibraryInfo, LibraryUid};

use super::http::HttpTransport;
use super::LibraryApi;
use crate::error::GatewayResult;
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};

/// Client for the library catalog service.
pub struct LibraryClient {
    transport: HttpTransport,
    breaker: CircuitBreaker,
}

impl LibraryClient {
    pub fn new(
        base_url: impl Into<String>,
        breaker_config: CircuitBreakerConfig,
    ) -> GatewayResult<Self> {
        Ok(Self {
            transport: HttpTransport::new(base_url, StatusCode::BAD_REQUEST)?,
            breaker: CircuitBreaker::new("library", breaker_config),
        })
    }
}

#[async_trait]
impl LibraryApi for LibraryClient {
    fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn get_libraries(&self, city: &str) -> GatewayResult<Vec<Library>> {
        self.transport
            .get_json_with_query("/api/v1/libraries", None, &[("city", city)])
            .await
    }

    async fn get_library(&self, library_uid: LibraryUid) -> GatewayResult<LibraryInfo> {
        self.transport
            .get_json(&format!("/api/v1/libraries/{library_uid}"), None)
            .await
    }

    async fn get_books(
        &self,
        library_uid: LibraryUid,
        show_all: bool,
    ) -> GatewayResult<Vec<BookInfo>> {
        self.transport
            .get_json_with_query(
                &format!("/api/v1/libraries/{library_uid}/books"),
                None,
                &[("showAll", show_all.to_string())],
            )
            .await
    }

    async fn get_book(
        &self,
        library_uid: LibraryUid,
        book_uid: BookUid,
    ) -> GatewayResult<BookInfo> {
        self.transport
            .get_json(
                &format!("/api/v1/libraries/{library_uid}/books/{book_uid}"),
                None,
            )
            .await
    }

    async fn adjust_availability(&self, req: &AvailabilityRequest) -> GatewayResult<()> {
        self.transport
            .patch_json("/api/v1/libraries/books", None, req)
            .await
    }
}
