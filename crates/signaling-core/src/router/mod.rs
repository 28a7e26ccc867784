//! Signaling router
//!
//! Relays session-negotiation frames between connected clients. A frame is
//! routed by its top-level `to` field and forwarded byte-for-byte; nothing
//! else in the payload is read, so any offer/answer/candidate shape passes
//! through. Delivery is fire-and-forget: the sender never hears whether the
//! peer got the frame.

use std::fmt;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::errors::FrameError;
use crate::registry::{ConnectionHandle, ConnectionRegistry};
use crate::types::UserHandle;

pub mod frame;
pub mod stats;

pub use frame::{extract_destination, InboundFrame};
pub use stats::{RouterStats, RouterStatsSnapshot};

/// Router behaviour knobs
#[derive(Debug, Clone, Default)]
pub struct RouterConfig {
    /// Close the connection displaced when a handle registers again
    pub close_superseded: bool,
}

/// What happened to one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Handed to the destination's connection
    Delivered { to: UserHandle },
    /// Destination not connected, or its write failed
    Undeliverable { to: UserHandle },
    /// No routable `to` field
    Malformed(FrameError),
    /// Binary frames are not relayed
    Unsupported,
}

/// Per-session totals, returned when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: u64,
    pub delivered: u64,
    pub dropped: u64,
}

/// Routes frames from each connection to the peer named in them
#[derive(Debug, Clone)]
pub struct SignalingRouter {
    registry: Arc<ConnectionRegistry>,
    stats: Arc<RouterStats>,
    config: RouterConfig,
}

impl SignalingRouter {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self::with_config(registry, RouterConfig::default())
    }

    pub fn with_config(registry: Arc<ConnectionRegistry>, config: RouterConfig) -> Self {
        Self {
            registry,
            stats: Arc::new(RouterStats::default()),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> RouterStatsSnapshot {
        self.stats.snapshot()
    }

    /// Run the session for one accepted connection until its read side fails.
    ///
    /// The connection is registered under `handle` first and unregistered
    /// when `inbound` ends or yields an error; that is the only way out.
    pub async fn serve<S, E>(
        &self,
        handle: UserHandle,
        conn: ConnectionHandle,
        inbound: S,
    ) -> SessionSummary
    where
        S: Stream<Item = Result<InboundFrame, E>>,
        E: fmt::Display,
    {
        let mut inbound = std::pin::pin!(inbound);
        let mut summary = SessionSummary::default();

        self.stats.session_started();
        if let Some(superseded) = self.registry.register(handle.clone(), conn.clone()) {
            if self.config.close_superseded && !superseded.same_connection(&conn) {
                info!(%handle, superseded = %superseded.id(), "Closing superseded connection");
                superseded.close();
            }
        }
        info!(%handle, connection = %conn.id(), "Signaling session started");

        loop {
            match inbound.next().await {
                Some(Ok(frame)) => {
                    summary.frames += 1;
                    match self.route(&handle, frame) {
                        RouteOutcome::Delivered { .. } => summary.delivered += 1,
                        _ => summary.dropped += 1,
                    }
                }
                Some(Err(err)) => {
                    debug!(%handle, connection = %conn.id(), error = %err, "Read failed");
                    break;
                }
                None => {
                    debug!(%handle, connection = %conn.id(), "Inbound stream ended");
                    break;
                }
            }
        }

        self.registry.unregister(&handle, &conn);
        info!(
            %handle,
            connection = %conn.id(),
            frames = summary.frames,
            delivered = summary.delivered,
            dropped = summary.dropped,
            "Signaling session closed"
        );
        summary
    }

    /// Route a single frame received from `from`
    pub fn route(&self, from: &UserHandle, frame: InboundFrame) -> RouteOutcome {
        self.stats.frame_received();

        let text = match frame {
            InboundFrame::Text(text) => text,
            InboundFrame::Binary(bytes) => {
                self.stats.record_unsupported();
                debug!(%from, len = bytes.len(), "Dropping binary frame");
                return RouteOutcome::Unsupported;
            }
        };

        let to = match extract_destination(&text) {
            Ok(to) => to,
            Err(err) => {
                self.stats.record_malformed();
                warn!(%from, error = %err, "Dropping unroutable signaling frame");
                return RouteOutcome::Malformed(err);
            }
        };

        if self.registry.send(&to, text) {
            self.stats.record_delivered();
            debug!(%from, %to, "Signaling frame relayed");
            RouteOutcome::Delivered { to }
        } else {
            self.stats.record_undeliverable();
            warn!(%from, %to, "Signaling target not connected");
            RouteOutcome::Undeliverable { to }
        }
    }
}
