//! Call notifications pushed to connected peers

use std::fmt;

use serde::Serialize;

use crate::types::{CallId, UserHandle};

/// Kind of call event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    IncomingCall,
    CallAccepted,
    CallRejected,
    CallEnded,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationKind::IncomingCall => "incoming_call",
            NotificationKind::CallAccepted => "call_accepted",
            NotificationKind::CallRejected => "call_rejected",
            NotificationKind::CallEnded => "call_ended",
        };
        f.write_str(name)
    }
}

/// One live event addressed to one handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: UserHandle,
    pub kind: NotificationKind,
    pub call_id: CallId,
    /// The other party of the call, from the recipient's point of view
    pub counterpart: UserHandle,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent<'a> {
    IncomingCall { call_id: CallId, from: &'a UserHandle },
    CallAccepted { call_id: CallId, by: &'a UserHandle },
    CallRejected { call_id: CallId, by: &'a UserHandle },
    CallEnded { call_id: CallId, peer: &'a UserHandle },
}

impl Notification {
    pub fn new(
        recipient: UserHandle,
        kind: NotificationKind,
        call_id: CallId,
        counterpart: UserHandle,
    ) -> Self {
        Self { recipient, kind, call_id, counterpart }
    }

    /// JSON text frame sent to the recipient
    pub fn to_wire(&self) -> serde_json::Result<String> {
        let call_id = self.call_id;
        let counterpart = &self.counterpart;
        let event = match self.kind {
            NotificationKind::IncomingCall => WireEvent::IncomingCall { call_id, from: counterpart },
            NotificationKind::CallAccepted => WireEvent::CallAccepted { call_id, by: counterpart },
            NotificationKind::CallRejected => WireEvent::CallRejected { call_id, by: counterpart },
            NotificationKind::CallEnded => WireEvent::CallEnded { call_id, peer: counterpart },
        };
        serde_json::to_string(&event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn wire(kind: NotificationKind) -> Value {
        let n = Notification::new(
            UserHandle::parse("bob").unwrap(),
            kind,
            CallId(7),
            UserHandle::parse("alice").unwrap(),
        );
        serde_json::from_str(&n.to_wire().unwrap()).unwrap()
    }

    #[test]
    fn wire_format_per_kind() {
        assert_eq!(
            wire(NotificationKind::IncomingCall),
            json!({"type": "incoming_call", "call_id": 7, "from": "alice"})
        );
        assert_eq!(
            wire(NotificationKind::CallAccepted),
            json!({"type": "call_accepted", "call_id": 7, "by": "alice"})
        );
        assert_eq!(
            wire(NotificationKind::CallRejected),
            json!({"type": "call_rejected", "call_id": 7, "by": "alice"})
        );
        assert_eq!(
            wire(NotificationKind::CallEnded),
            json!({"type": "call_ended", "call_id": 7, "peer": "alice"})
        );
    }

    #[test]
    fn every_kind_encodes_to_a_tagged_object() {
        for kind in [
            NotificationKind::IncomingCall,
            NotificationKind::CallAccepted,
            NotificationKind::CallRejected,
            NotificationKind::CallEnded,
        ] {
            let n = Notification::new(
                UserHandle::parse("bob").unwrap(),
                kind,
                CallId(1),
                UserHandle::parse("alice").unwrap(),
            );
            let frame = n.to_wire().expect("encodes");
            assert!(!frame.is_empty());
            assert_eq!(serde_json::from_str::<Value>(&frame).unwrap()["type"], kind.to_string());
        }
    }
}
