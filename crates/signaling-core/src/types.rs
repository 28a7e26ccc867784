//! Core types shared by the registry, router and lifecycle

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::EmptyHandle;

/// Case-normalized user identifier (usually an email address).
///
/// Handles are trimmed and lower-cased on construction and are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct UserHandle(String);

impl UserHandle {
    /// Normalize `raw` into a handle, rejecting empty input
    pub fn parse(raw: &str) -> Result<Self, EmptyHandle> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(EmptyHandle);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserHandle {
    type Error = EmptyHandle;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for UserHandle {
    type Error = EmptyHandle;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl AsRef<str> for UserHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Call identifier assigned by the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub u64);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a call record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Pending,
    Accepted,
    Rejected,
    Ended,
}

impl CallStatus {
    /// No action is valid once a call is rejected or ended
    pub fn is_terminal(self) -> bool {
        matches!(self, CallStatus::Rejected | CallStatus::Ended)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CallStatus::Pending => "pending",
            CallStatus::Accepted => "accepted",
            CallStatus::Rejected => "rejected",
            CallStatus::Ended => "ended",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally requested call actions, one per HTTP operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallAction {
    Start,
    Accept,
    Reject,
    End,
}

impl fmt::Display for CallAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallAction::Start => "start",
            CallAction::Accept => "accept",
            CallAction::Reject => "reject",
            CallAction::End => "end",
        };
        f.write_str(name)
    }
}

/// A call between two handles, as stored by the persistence layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: CallId,
    #[serde(rename = "caller_email")]
    pub caller: UserHandle,
    #[serde(rename = "receiver_email")]
    pub receiver: UserHandle,
    pub status: CallStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallRecord {
    /// Create a fresh pending record
    pub fn new(id: CallId, caller: UserHandle, receiver: UserHandle) -> Self {
        let now = Utc::now();
        Self {
            id,
            caller,
            receiver,
            status: CallStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `handle` takes part in this call
    pub fn involves(&self, handle: &UserHandle) -> bool {
        &self.caller == handle || &self.receiver == handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_trimmed_and_lowercased() {
        let handle = UserHandle::parse("  Alice@Example.COM ").unwrap();
        assert_eq!(handle.as_str(), "alice@example.com");
    }

    #[test]
    fn empty_handles_are_rejected() {
        assert_eq!(UserHandle::parse(""), Err(EmptyHandle));
        assert_eq!(UserHandle::parse("   "), Err(EmptyHandle));
    }

    #[test]
    fn handle_deserialization_normalizes() {
        let handle: UserHandle = serde_json::from_str("\"BOB@x.io\"").unwrap();
        assert_eq!(handle.as_str(), "bob@x.io");
        assert!(serde_json::from_str::<UserHandle>("\"\"").is_err());
    }

    #[test]
    fn record_serializes_email_field_names() {
        let record = CallRecord::new(
            CallId(3),
            UserHandle::parse("a").unwrap(),
            UserHandle::parse("b").unwrap(),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["caller_email"], "a");
        assert_eq!(value["receiver_email"], "b");
        assert_eq!(value["status"], "pending");
    }

    #[test]
    fn terminal_statuses() {
        assert!(!CallStatus::Pending.is_terminal());
        assert!(!CallStatus::Accepted.is_terminal());
        assert!(CallStatus::Rejected.is_terminal());
        assert!(CallStatus::Ended.is_terminal());
    }
}
