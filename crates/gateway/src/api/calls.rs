//! Call handlers

use axum::extract::{Path, State};
use axum::Json;
use peerlink_signaling::{CallAction, CallId, CallRecord, UserHandle};
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use crate::GatewayState;

#[derive(Debug, Deserialize)]
pub struct StartCallRequest {
    pub caller_email: UserHandle,
    pub receiver_email: UserHandle,
}

#[derive(Debug, Deserialize)]
pub struct CallActionRequest {
    pub call_id: CallId,
}

pub async fn start_call(
    State(state): State<GatewayState>,
    Json(request): Json<StartCallRequest>,
) -> Result<Json<Value>, ApiError> {
    let call = state
        .calls
        .start_call(request.caller_email, request.receiver_email)
        .await?;
    Ok(Json(json!({
        "message": "Call initiated",
        "call_id": call.id,
    })))
}

pub async fn accept_call(
    State(state): State<GatewayState>,
    Json(request): Json<CallActionRequest>,
) -> Result<Json<Value>, ApiError> {
    state.calls.apply(request.call_id, CallAction::Accept).await?;
    Ok(Json(json!({ "message": "Call accepted" })))
}

pub async fn reject_call(
    State(state): State<GatewayState>,
    Json(request): Json<CallActionRequest>,
) -> Result<Json<Value>, ApiError> {
    state.calls.apply(request.call_id, CallAction::Reject).await?;
    Ok(Json(json!({ "message": "Call rejected" })))
}

pub async fn end_call(
    State(state): State<GatewayState>,
    Json(request): Json<CallActionRequest>,
) -> Result<Json<Value>, ApiError> {
    state.calls.apply(request.call_id, CallAction::End).await?;
    Ok(Json(json!({ "message": "Call ended" })))
}

pub async fn calls_by_email(
    State(state): State<GatewayState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<CallRecord>>, ApiError> {
    let handle = UserHandle::parse(&email).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(state.calls.calls_for(&handle).await?))
}
