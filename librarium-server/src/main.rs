use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use librarium_gateway::clients::{LibraryClient, RatingClient, ReservationClient, StatsClient};
use librarium_gateway::queue::{ChannelAuditLog, ChannelEnqueuer};
use librarium_gateway::{AppState, ReservationWorkflows};

mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "librarium_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Librarium gateway");

    let config = config::Config::load()?;
    tracing::info!("Configuration loaded");

    let library = LibraryClient::new(&config.library_url, config.breaker())?;
    let rating = RatingClient::new(&config.rating_url, config.breaker())?;
    let reservation = ReservationClient::new(&config.reservation_url, config.breaker())?;
    let stats = StatsClient::new(&config.stats_url, config.breaker())?;

    // The broker producer plugs in at these receivers; until then deferred
    // messages and audit events are drained to the log.
    let (enqueuer, mut deferred_rx) = ChannelEnqueuer::new();
    tokio::spawn(async move {
        while let Some(message) = deferred_rx.recv().await {
            tracing::info!(topic = %message.topic, payload = %message.payload, "deferred message drained");
        }
    });

    let (audit, mut audit_rx) = ChannelAuditLog::new();
    tokio::spawn(async move {
        while let Some(event) = audit_rx.recv().await {
            tracing::info!(username = %event.username, direction = ?event.direction, "audit event drained");
        }
    });

    let workflows = ReservationWorkflows::new(
        Arc::new(library),
        Arc::new(rating),
        Arc::new(reservation),
        Arc::new(stats),
        Arc::new(enqueuer),
        Arc::new(audit),
    );
    let state = AppState {
        workflows: Arc::new(workflows),
    };

    let app = Router::new()
        .route("/manage/health", get(health_check))
        .nest("/api/v1", librarium_gateway::routes(state))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
