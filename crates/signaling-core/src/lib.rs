//! # peerlink-signaling
//!
//! Real-time core of the peerlink call server.
//!
//! This crate provides:
//! - [`ConnectionRegistry`]: user handle → live connection, safe to use from
//!   every connection task and HTTP handler at once
//! - [`SignalingRouter`]: relays opaque signaling frames (offers, answers,
//!   ICE candidates) to the handle named in their `to` field
//! - [`lifecycle`]: the pending/accepted/rejected/ended call state machine
//!   and the notifications each transition pushes to connected peers
//!
//! ## Architecture
//!
//! Connection tasks and HTTP-triggered call transitions never talk to each
//! other directly; the registry is the only shared state. Delivery is
//! best-effort everywhere: a peer that is not connected simply misses the
//! frame, and the only trace is a log line and a counter.

pub mod errors;
pub mod lifecycle;
pub mod registry;
pub mod router;
pub mod types;

pub use errors::{EmptyHandle, FrameError, LifecycleError, TransportError};
pub use lifecycle::{
    transition, CallLifecycle, DispatchReport, Notification, NotificationKind, Transition,
};
pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, OutboundQueue};
pub use router::{InboundFrame, RouteOutcome, RouterConfig, SessionSummary, SignalingRouter};
pub use types::{CallAction, CallId, CallRecord, CallStatus, UserHandle};
