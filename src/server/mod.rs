//! HTTP serving
//!
//! Two listeners, as in the relay's configuration:
//!
//! - the API listener takes GSI POSTs from the observer client and serves the
//!   report endpoints (`/state`, `/players`, `/lastgsijson`);
//! - the push listener serves the SSE stream to any number of subscribers on
//!   any GET path.

pub mod routes;
pub mod sse;

use std::future::IntoFuture;
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock};

use crate::broker::BrokerHandle;
use crate::config::PlayerDirectory;
use crate::error::Result;
use crate::gsi::TeamState;
use crate::obs::ObsController;

pub use routes::{api_router, push_router};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Broadcast core handle
    pub broker: BrokerHandle,
    /// Live team roster
    pub teams: Arc<RwLock<TeamState>>,
    /// Last raw GSI payload, verbatim
    pub last_gsi: Arc<RwLock<Bytes>>,
    /// Configured camera assignments
    pub players: Arc<PlayerDirectory>,
    /// OBS camera switching
    pub obs: Arc<Mutex<ObsController>>,
}

/// Serve both listeners until `shutdown` resolves
pub async fn run_until<F>(
    api_addr: &str,
    push_addr: &str,
    state: AppState,
    shutdown: F,
) -> Result<()>
where
    F: std::future::Future<Output = ()>,
{
    let api_listener = TcpListener::bind(api_addr).await?;
    tracing::info!(addr = api_addr, "API listener bound");

    let push_listener = TcpListener::bind(push_addr).await?;
    tracing::info!(addr = push_addr, "Push listener bound");

    let api = axum::serve(api_listener, api_router(state.clone())).into_future();
    let push = axum::serve(push_listener, push_router(state)).into_future();

    tokio::select! {
        _ = shutdown => {
            tracing::info!("Shutdown signal received");
            Ok(())
        }
        result = api => result.map_err(Into::into),
        result = push => result.map_err(Into::into),
    }
}
