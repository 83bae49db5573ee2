//! Best-effort side channels: deferred-retry enqueue and the audit log.
//!
//! Both are fire-and-forget hand-offs with no ordering guarantee and no
//! read-back; failures are logged by the workflows, never propagated. The
//! channel-backed implementations stand where the messaging subsystem plugs
//! in.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use librarium_core::{BookUid, LibraryUid, ReservationUid, Username};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{GatewayError, GatewayResult};

pub mod topics {
    /// Deferred availability adjustments replayed against the library
    /// service.
    pub const LIBRARY_AVAILABILITY: &str = "library-availability";
    /// Deferred rating adjustments replayed against the rating service.
    pub const USER_RATING: &str = "user-rating";
    /// Audit events consumed by the stats service.
    pub const RESERVATION_STATS: &str = "reservation-stats";
}

/// Whether a book went out (create) or came back (return).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// Audit record emitted after each workflow, consumed by the stats service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub username: Username,
    pub reservation_uid: ReservationUid,
    pub library_uid: LibraryUid,
    pub book_uid: BookUid,
    pub stars: Option<i32>,
    pub direction: Direction,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Enqueuer: Send + Sync {
    /// Hand a payload off for later asynchronous replay. Best-effort: the
    /// caller logs failures and moves on.
    async fn enqueue(&self, topic: &str, payload: serde_json::Value) -> GatewayResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Emit an audit event. Same best-effort contract as [`Enqueuer`].
    async fn log(&self, event: AuditEvent) -> GatewayResult<()>;
}

/// A message accepted by [`ChannelEnqueuer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// In-process enqueuer backed by an unbounded channel. The receiving half is
/// where a broker producer would drain from.
pub struct ChannelEnqueuer {
    tx: mpsc::UnboundedSender<QueuedMessage>,
}

impl ChannelEnqueuer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<QueuedMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Enqueuer for ChannelEnqueuer {
    async fn enqueue(&self, topic: &str, payload: serde_json::Value) -> GatewayResult<()> {
        self.tx
            .send(QueuedMessage {
                topic: topic.to_string(),
                payload,
            })
            .map_err(|err| GatewayError::Internal(format!("enqueue: {err}")))
    }
}

/// In-process audit log backed by an unbounded channel.
pub struct ChannelAuditLog {
    tx: mpsc::UnboundedSender<AuditEvent>,
}

impl ChannelAuditLog {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AuditEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl AuditLog for ChannelAuditLog {
    async fn log(&self, event: AuditEvent) -> GatewayResult<()> {
        self.tx
            .send(event)
            .map_err(|err| GatewayError::Internal(format!("audit log: {err}")))
    }
}
