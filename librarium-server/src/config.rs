use std::time::Duration;

use anyhow::Result;
use config::{Config as ConfigLoader, Environment, File};
use librarium_gateway::resilience::CircuitBreakerConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub port: u16,
    pub library_url: String,
    pub rating_url: String,
    pub reservation_url: String,
    pub stats_url: String,
    pub breaker_window_size: usize,
    pub breaker_failure_threshold: f64,
    pub breaker_open_timeout_ms: u64,
    pub breaker_recovery_requests: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("LIBRARIUM"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            window_size: self.breaker_window_size,
            failure_threshold: self.breaker_failure_threshold,
            open_timeout: Duration::from_millis(self.breaker_open_timeout_ms),
            recovery_requests: self.breaker_recovery_requests,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            library_url: "http://localhost:8060".to_string(),
            rating_url: "http://localhost:8050".to_string(),
            reservation_url: "http://localhost:8070".to_string(),
            stats_url: "http://localhost:8040".to_string(),
            breaker_window_size: 100,
            breaker_failure_threshold: 0.2,
            breaker_open_timeout_ms: 1000,
            breaker_recovery_requests: 2,
        }
    }
}
