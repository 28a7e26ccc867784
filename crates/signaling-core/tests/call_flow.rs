//! End-to-end call flow over the registry, router and lifecycle
//!
//! Caller "a" rings receiver "b", "b" accepts, "a" hangs up; both sides see
//! every push and the finished call refuses further actions.

use std::sync::Arc;

use peerlink_signaling::{
    transition, CallAction, CallId, CallLifecycle, CallRecord, CallStatus, ConnectionHandle,
    ConnectionRegistry, InboundFrame, LifecycleError, OutboundQueue, RouteOutcome,
    SignalingRouter, UserHandle,
};
use serde_json::Value;

fn handle(name: &str) -> UserHandle {
    UserHandle::parse(name).unwrap()
}

async fn next_json(queue: &mut OutboundQueue) -> Value {
    let frame = queue.next().await.expect("frame");
    serde_json::from_str(&frame).expect("json frame")
}

/// Apply an action the way the gateway does: transition, commit, dispatch
fn apply(lifecycle: &CallLifecycle, stored: &mut CallRecord, action: CallAction) -> Result<(), LifecycleError> {
    let t = transition(stored, action)?;
    *stored = t.record;
    lifecycle.dispatch(&t.notifications);
    Ok(())
}

#[tokio::test]
async fn caller_and_receiver_see_the_whole_call() {
    let registry = Arc::new(ConnectionRegistry::new());
    let lifecycle = CallLifecycle::new(registry.clone());

    let (a, mut a_queue) = ConnectionHandle::channel(16);
    let (b, mut b_queue) = ConnectionHandle::channel(16);
    registry.register(handle("a"), a);
    registry.register(handle("b"), b);

    let mut call = CallRecord::new(CallId(42), handle("a"), handle("b"));

    apply(&lifecycle, &mut call, CallAction::Start).unwrap();
    let ring = next_json(&mut b_queue).await;
    assert_eq!(ring["type"], "incoming_call");
    assert_eq!(ring["from"], "a");
    assert_eq!(ring["call_id"], 42);

    apply(&lifecycle, &mut call, CallAction::Accept).unwrap();
    let accepted = next_json(&mut a_queue).await;
    assert_eq!(accepted["type"], "call_accepted");
    assert_eq!(accepted["by"], "b");

    apply(&lifecycle, &mut call, CallAction::End).unwrap();
    assert_eq!(next_json(&mut a_queue).await["type"], "call_ended");
    assert_eq!(next_json(&mut b_queue).await["type"], "call_ended");
    assert_eq!(call.status, CallStatus::Ended);

    let before = call.clone();
    let err = apply(&lifecycle, &mut call, CallAction::End).unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidTransition { from: CallStatus::Ended, .. }));
    assert_eq!(call, before);
}

#[tokio::test]
async fn signaling_and_notifications_share_one_queue_in_order() {
    let registry = Arc::new(ConnectionRegistry::new());
    let router = SignalingRouter::new(registry.clone());
    let lifecycle = CallLifecycle::new(registry.clone());

    let (b, mut b_queue) = ConnectionHandle::channel(16);
    registry.register(handle("b"), b);

    let mut call = CallRecord::new(CallId(1), handle("a"), handle("b"));
    apply(&lifecycle, &mut call, CallAction::Start).unwrap();

    let offer = r#"{"type":"offer","to":"b","offer":{"type":"offer","sdp":"v=0\r\n"}}"#;
    let outcome = router.route(&handle("a"), InboundFrame::Text(offer.to_string()));
    assert_eq!(outcome, RouteOutcome::Delivered { to: handle("b") });

    assert_eq!(next_json(&mut b_queue).await["type"], "incoming_call");
    assert_eq!(b_queue.next().await.as_deref(), Some(offer));
}

#[tokio::test]
async fn offline_receiver_does_not_block_the_transition() {
    let registry = Arc::new(ConnectionRegistry::new());
    let lifecycle = CallLifecycle::new(registry);

    let call = CallRecord::new(CallId(5), handle("a"), handle("b"));
    let t = transition(&call, CallAction::Start).unwrap();
    let report = lifecycle.dispatch(&t.notifications);

    assert_eq!(report.delivered, 0);
    assert_eq!(report.undelivered, 1);
    assert_eq!(t.record.status, CallStatus::Pending);
}
