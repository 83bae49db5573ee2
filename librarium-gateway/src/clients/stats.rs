use async_trait::async_trait;
use axum::http::StatusCode;
use librarium_core::Username;

use super::http::HttpTransport;
use super::StatsApi;
use crate::dto::StatsInfo;
use crate::error::GatewayResult;
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};

/// Client for the stats service.
pub struct StatsClient {
    transport: HttpTransport,
    breaker: CircuitBreaker,
}

impl StatsClient {
    pub fn new(
        base_url: impl Into<String>,
        breaker_config: CircuitBreakerConfig,
    ) -> GatewayResult<Self> {
        Ok(Self {
            transport: HttpTransport::new(base_url, StatusCode::BAD_REQUEST)?,
            breaker: CircuitBreaker::new("stats", breaker_config),
        })
    }
}

#[async_trait]
impl StatsApi for StatsClient {
    fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    async fn get_stats(&self, user: &Username) -> GatewayResult<StatsInfo> {
        self.transport.get_json("/api/v1/stats", Some(user)).await
    }
}
