use async_trait::async_trait;
use axum::http::StatusCode;
use librarium_core::{Rating, Username};
use serde_json::json;

use super::http::HttpTransport;
use super::RatingApi;
use crate::error::GatewayResult;
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};

/// Client for the rating service. Transport failures here read as 503 so an
/// unreachable rating service takes the deferred-retry path.
pub struct RatingClient {
    transport: HttpTransport,
    breaker: CircuitBreaker,
}

impl RatingClient {
    pub fn new(
        base_url: impl Into<String>,
        breaker_config: CircuitBreakerConfig,
    ) -> GatewayResult<Self> {
        Ok(Self {
            transport: HttpTransport::new(base_url, StatusCode::SERVICE_UNAVAILABLE)?,
            breaker: CircuitBreaker::new("rating", breaker_config),
        })
    }
}

#[async_trait]
impl RatingApi for RatingClient {
    fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn get_rating(&self, user: &Username) -> GatewayResult<Rating> {
        self.transport.get_json("/api/v1/rating", Some(user)).await
    }

    async fn adjust_rating(&self, user: &Username, delta_stars: i32) -> GatewayResult<()> {
        self.transport
            .patch_json("/api/v1/rating", Some(user), &json!({ "stars": delta_stars }))
            .await
    }
}
