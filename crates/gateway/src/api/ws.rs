//! WebSocket endpoint running one signaling session per connection

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use peerlink_signaling::{ConnectionHandle, InboundFrame, TransportError, UserHandle};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::ApiError;
use crate::GatewayState;

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub email: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<GatewayState>,
) -> Response {
    let handle = match params.email.as_deref().map(UserHandle::parse) {
        Some(Ok(handle)) => handle,
        _ => return ApiError::BadRequest("Missing email".to_string()).into_response(),
    };
    ws.on_upgrade(move |socket| handle_socket(socket, handle, state))
}

async fn handle_socket(socket: WebSocket, handle: UserHandle, state: GatewayState) {
    info!(%handle, "New WebSocket connection");

    let capacity = state.config.signaling.outbound_queue_capacity;
    let (conn, mut queue) = ConnectionHandle::channel(capacity);
    let (mut sink, stream) = socket.split();

    let writer = {
        let handle = handle.clone();
        tokio::spawn(async move {
            while let Some(frame) = queue.next().await {
                if let Err(err) = sink.send(Message::Text(frame)).await {
                    debug!(%handle, error = %err, "WebSocket write failed");
                    return;
                }
            }
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
        })
    };

    let inbound = stream
        .filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => Some(Ok(InboundFrame::Text(text))),
                Ok(Message::Binary(bytes)) => Some(Ok(InboundFrame::Binary(bytes))),
                Ok(Message::Ping(_) | Message::Pong(_)) => None,
                Ok(Message::Close(_)) => Some(Err(TransportError::Closed)),
                Err(err) => Some(Err(TransportError::read(err.to_string()))),
            }
        })
        .take_until(conn.closed());

    state.router.serve(handle.clone(), conn.clone(), inbound).await;

    // Stops the writer if the read side ended first.
    conn.close();
    join_writer(&handle, writer).await;
}

/// Wait for the writer task, logging it if it panicked or was cancelled
async fn join_writer(handle: &UserHandle, writer: JoinHandle<()>) -> bool {
    match writer.await {
        Ok(()) => true,
        Err(err) => {
            warn!(%handle, error = %err, "WebSocket writer task failed");
            false
        }
    }
}
