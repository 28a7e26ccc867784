//! Error types for peerlink-signaling
//!
//! None of these errors ever travel back to a WebSocket client. Transport
//! and frame errors stay local to one connection; lifecycle errors are
//! surfaced by the gateway as a rejected HTTP request.

use thiserror::Error;

use crate::types::{CallAction, CallId, CallStatus};

/// Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Errors raised by the call lifecycle state machine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// The action's precondition does not hold for the record's status
    #[error("cannot {action} call {call_id} while it is {from}")]
    InvalidTransition {
        call_id: CallId,
        from: CallStatus,
        action: CallAction,
    },
}

impl LifecycleError {
    /// Create an invalid transition error
    pub fn invalid_transition(call_id: CallId, from: CallStatus, action: CallAction) -> Self {
        Self::InvalidTransition { call_id, from, action }
    }
}

/// Reasons a signaling frame cannot be routed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame is not a JSON object: {0}")]
    NotJson(String),

    #[error("frame has no string `to` field")]
    MissingDestination,

    #[error("frame has an empty `to` field")]
    EmptyDestination,
}

/// Inbound transport failures. Any of these ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection closed by peer")]
    Closed,

    #[error("read failed: {0}")]
    Read(String),
}

impl TransportError {
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read(message.into())
    }
}

/// A user handle was empty after normalization
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("user handle must not be empty")]
pub struct EmptyHandle;
