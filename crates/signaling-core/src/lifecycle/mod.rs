//! Call lifecycle state machine
//!
//! ```text
//! pending ──accept──▶ accepted ──end──▶ ended
//!    │                                   ▲
//!    ├──reject──▶ rejected               │
//!    └──────────────end──────────────────┘
//! ```
//!
//! [`transition`] is pure: it takes the current record and an action and
//! returns the next record plus the notifications the change implies. The
//! caller persists the record and only then hands the notifications to
//! [`CallLifecycle::dispatch`], so a client that reloads state after a push
//! always sees the new status.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::errors::{LifecycleError, Result};
use crate::registry::ConnectionRegistry;
use crate::types::{CallAction, CallRecord, CallStatus};

pub mod notification;

pub use notification::{Notification, NotificationKind};

/// Outcome of a valid transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub record: CallRecord,
    pub notifications: Vec<Notification>,
}

/// Apply `action` to `record`.
///
/// On error the caller's record is untouched and nothing should be sent.
pub fn transition(record: &CallRecord, action: CallAction) -> Result<Transition> {
    use CallAction::*;
    use CallStatus::*;

    let (next, notifications) = match (record.status, action) {
        (Pending, Start) => (
            Pending,
            vec![Notification::new(
                record.receiver.clone(),
                NotificationKind::IncomingCall,
                record.id,
                record.caller.clone(),
            )],
        ),
        (Pending, Accept) => (
            Accepted,
            vec![Notification::new(
                record.caller.clone(),
                NotificationKind::CallAccepted,
                record.id,
                record.receiver.clone(),
            )],
        ),
        (Pending, Reject) => (
            Rejected,
            vec![Notification::new(
                record.caller.clone(),
                NotificationKind::CallRejected,
                record.id,
                record.receiver.clone(),
            )],
        ),
        (Pending | Accepted, End) => (
            Ended,
            vec![
                Notification::new(
                    record.caller.clone(),
                    NotificationKind::CallEnded,
                    record.id,
                    record.receiver.clone(),
                ),
                Notification::new(
                    record.receiver.clone(),
                    NotificationKind::CallEnded,
                    record.id,
                    record.caller.clone(),
                ),
            ],
        ),
        (from, action) => return Err(LifecycleError::invalid_transition(record.id, from, action)),
    };

    let mut updated = record.clone();
    updated.status = next;
    updated.updated_at = Utc::now();
    debug!(call_id = %record.id, %action, from = %record.status, to = %next, "Call transition");

    Ok(Transition {
        record: updated,
        notifications,
    })
}

/// Delivery totals for one batch of notifications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub undelivered: usize,
}

/// Pushes lifecycle notifications to connected peers
#[derive(Debug, Clone)]
pub struct CallLifecycle {
    registry: Arc<ConnectionRegistry>,
}

impl CallLifecycle {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Send each notification to its recipient, best-effort.
    ///
    /// A recipient without a live connection just misses the push; the
    /// transition it describes has already been committed.
    pub fn dispatch(&self, notifications: &[Notification]) -> DispatchReport {
        let mut report = DispatchReport::default();
        for notification in notifications {
            let frame = match notification.to_wire() {
                Ok(frame) => frame,
                Err(err) => {
                    report.undelivered += 1;
                    warn!(
                        recipient = %notification.recipient,
                        kind = %notification.kind,
                        call_id = %notification.call_id,
                        error = %err,
                        "Call notification could not be encoded"
                    );
                    continue;
                }
            };
            if self.registry.send(&notification.recipient, frame) {
                report.delivered += 1;
                debug!(
                    recipient = %notification.recipient,
                    kind = %notification.kind,
                    call_id = %notification.call_id,
                    "Call notification pushed"
                );
            } else {
                report.undelivered += 1;
                debug!(
                    recipient = %notification.recipient,
                    kind = %notification.kind,
                    call_id = %notification.call_id,
                    "Call notification not delivered, recipient offline"
                );
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CallId, UserHandle};

    fn record(status: CallStatus) -> CallRecord {
        let mut record = CallRecord::new(
            CallId(1),
            UserHandle::parse("caller").unwrap(),
            UserHandle::parse("receiver").unwrap(),
        );
        record.status = status;
        record
    }

    #[test]
    fn start_rings_the_receiver() {
        let t = transition(&record(CallStatus::Pending), CallAction::Start).unwrap();
        assert_eq!(t.record.status, CallStatus::Pending);
        assert_eq!(t.notifications.len(), 1);
        assert_eq!(t.notifications[0].recipient.as_str(), "receiver");
        assert_eq!(t.notifications[0].kind, NotificationKind::IncomingCall);
        assert_eq!(t.notifications[0].counterpart.as_str(), "caller");
    }

    #[test]
    fn accept_notifies_caller() {
        let t = transition(&record(CallStatus::Pending), CallAction::Accept).unwrap();
        assert_eq!(t.record.status, CallStatus::Accepted);
        assert_eq!(
            t.notifications,
            vec![Notification::new(
                UserHandle::parse("caller").unwrap(),
                NotificationKind::CallAccepted,
                CallId(1),
                UserHandle::parse("receiver").unwrap(),
            )]
        );
    }

    #[test]
    fn reject_notifies_caller() {
        let t = transition(&record(CallStatus::Pending), CallAction::Reject).unwrap();
        assert_eq!(t.record.status, CallStatus::Rejected);
        assert_eq!(t.notifications.len(), 1);
        assert_eq!(t.notifications[0].recipient.as_str(), "caller");
        assert_eq!(t.notifications[0].kind, NotificationKind::CallRejected);
    }

    #[test]
    fn end_notifies_both_parties() {
        for from in [CallStatus::Pending, CallStatus::Accepted] {
            let t = transition(&record(from), CallAction::End).unwrap();
            assert_eq!(t.record.status, CallStatus::Ended);
            let recipients: Vec<&str> =
                t.notifications.iter().map(|n| n.recipient.as_str()).collect();
            assert_eq!(recipients, vec!["caller", "receiver"]);
            assert!(t.notifications.iter().all(|n| n.kind == NotificationKind::CallEnded));
        }
    }

    #[test]
    fn invalid_actions_are_rejected() {
        let invalid = [
            (CallStatus::Accepted, CallAction::Start),
            (CallStatus::Accepted, CallAction::Accept),
            (CallStatus::Accepted, CallAction::Reject),
            (CallStatus::Rejected, CallAction::Start),
            (CallStatus::Rejected, CallAction::Accept),
            (CallStatus::Rejected, CallAction::Reject),
            (CallStatus::Rejected, CallAction::End),
            (CallStatus::Ended, CallAction::Start),
            (CallStatus::Ended, CallAction::Accept),
            (CallStatus::Ended, CallAction::Reject),
            (CallStatus::Ended, CallAction::End),
        ];
        for (status, action) in invalid {
            let before = record(status);
            let err = transition(&before, action).unwrap_err();
            assert_eq!(err, LifecycleError::invalid_transition(CallId(1), status, action));
            assert_eq!(before.status, status);
        }
    }

    #[tokio::test]
    async fn dispatch_counts_offline_recipients() {
        use crate::registry::ConnectionHandle;

        let registry = Arc::new(ConnectionRegistry::new());
        let (caller, mut caller_queue) = ConnectionHandle::channel(4);
        registry.register(UserHandle::parse("caller").unwrap(), caller);

        let lifecycle = CallLifecycle::new(registry);
        let t = transition(&record(CallStatus::Accepted), CallAction::End).unwrap();
        let report = lifecycle.dispatch(&t.notifications);

        assert_eq!(report, DispatchReport { delivered: 1, undelivered: 1 });
        let pushed = caller_queue.next().await.unwrap();
        assert!(pushed.contains("\"call_ended\""));
    }
}
