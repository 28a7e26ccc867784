//! Inbound frames and destination extraction

use serde_json::{Map, Value};

use crate::errors::FrameError;
use crate::types::UserHandle;

/// A frame read from a client connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary(Vec<u8>),
}

/// Read the destination handle out of a signaling frame.
///
/// Only the top-level `to` string matters; the rest of the payload is not
/// inspected.
pub fn extract_destination(text: &str) -> Result<UserHandle, FrameError> {
    let object: Map<String, Value> =
        serde_json::from_str(text).map_err(|err| FrameError::NotJson(err.to_string()))?;
    let to = object
        .get("to")
        .and_then(Value::as_str)
        .ok_or(FrameError::MissingDestination)?;
    UserHandle::parse(to).map_err(|_| FrameError::EmptyDestination)
}
