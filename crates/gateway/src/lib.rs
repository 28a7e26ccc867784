//! # peerlink-gateway
//!
//! HTTP and WebSocket front end for peerlink.
//!
//! This crate provides:
//! - the `/ws?email=` endpoint, one signaling session per connection
//! - REST call actions (`/call`, `/accept`, `/reject`, `/end`) that drive
//!   the call lifecycle and push notifications to connected peers
//! - a [`CallStore`] persistence trait with an in-memory implementation
//! - layered configuration and logging setup for the binary

use std::future::Future;
use std::sync::Arc;

use peerlink_signaling::{ConnectionRegistry, SignalingRouter};
use tokio::net::TcpListener;
use tracing::info;

pub mod api;
pub mod config;
pub mod logging;
pub mod service;
pub mod store;

pub use crate::config::GatewayConfig;
pub use crate::service::CallService;
pub use crate::store::{CallStore, InMemoryCallStore};

/// Shared state handed to every request
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<GatewayConfig>,
    pub registry: Arc<ConnectionRegistry>,
    pub router: SignalingRouter,
    pub calls: Arc<CallService>,
}

impl GatewayState {
    pub fn new(config: GatewayConfig, store: Arc<dyn CallStore>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let router = SignalingRouter::with_config(registry.clone(), config.router_config());
        let calls = Arc::new(CallService::new(store, registry.clone()));
        Self {
            config: Arc::new(config),
            registry,
            router,
            calls,
        }
    }
}

/// Serve the API on `listener` until `shutdown` resolves.
///
/// On shutdown every open WebSocket is closed, which ends its session and
/// unregisters it.
pub async fn serve<F>(listener: TcpListener, state: GatewayState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let registry = state.registry.clone();
    let app = api::create_router(state);

    info!(addr = %listener.local_addr()?, "Gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            let closed = registry.close_all();
            info!(closed, "Shutting down, closed open connections");
        })
        .await
}
