//! API routes: GSI ingest and report endpoints

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::gsi::GsiPayload;
use crate::server::{sse, AppState};

/// Router for the API listener
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(receive_game_status))
        .route("/state", get(report_game_state))
        .route("/players", get(report_players))
        .route("/lastgsijson", get(report_last_gsi))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Router for the push listener: every GET path is the event stream, matching
/// the original service which answered the stream on any path
pub fn push_router(state: AppState) -> Router {
    Router::new()
        .fallback(get(sse::subscribe_events))
        .with_state(state)
}

/// Handle a GSI POST from the observer client.
///
/// The raw payload is retained for `/lastgsijson` even when it does not
/// parse. A parsed payload updates the roster, which is then serialized and
/// published to the broadcast core, and finally drives the OBS camera switch.
async fn receive_game_status(State(state): State<AppState>, body: Bytes) -> StatusCode {
    *state.last_gsi.write().await = body.clone();

    let payload = match GsiPayload::parse(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, bytes = body.len(), "Discarding unparseable GSI payload");
            return StatusCode::BAD_REQUEST;
        }
    };

    let snapshot = {
        let mut teams = state.teams.write().await;
        teams.apply(&payload);
        serde_json::to_vec(&*teams)
    };

    match snapshot {
        Ok(json) => {
            if let Err(e) = state.broker.publish(Bytes::from(json)).await {
                tracing::error!(error = %e, "State broadcast failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Team state serialization failed");
        }
    }

    if let Some(steamid) = payload.observed_steamid() {
        state.obs.lock().await.switch_player(steamid).await;
    }

    StatusCode::OK
}

/// `GET /state`: current team roster, pretty-printed
async fn report_game_state(State(state): State<AppState>) -> Response {
    let teams = state.teams.read().await;

    match serde_json::to_string_pretty(&*teams) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Team state serialization failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /players`: configured camera assignments
async fn report_players(State(state): State<AppState>) -> Response {
    match serde_json::to_string_pretty(&*state.players) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Player directory serialization failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /lastgsijson`: last raw GSI payload, verbatim
async fn report_last_gsi(State(state): State<AppState>) -> Bytes {
    state.last_gsi.read().await.clone()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::{Mutex, RwLock};
    use tokio::time::timeout;

    use crate::broker::{Broker, BrokerConfig};
    use crate::config::PlayerDirectory;
    use crate::gsi::TeamState;
    use crate::obs::ObsController;

    use super::*;

    async fn test_state() -> AppState {
        let (_task, broker) = Broker::spawn(BrokerConfig::default());
        let obs = ObsController::connect(&[], PlayerDirectory::new(), true)
            .await
            .unwrap();

        AppState {
            broker,
            teams: Arc::new(RwLock::new(TeamState::default())),
            last_gsi: Arc::new(RwLock::new(Bytes::new())),
            players: Arc::new(PlayerDirectory::new()),
            obs: Arc::new(Mutex::new(obs)),
        }
    }

    const SAMPLE: &str = r#"{
        "player": {"steamid": "76561197960287930", "name": "alpha"},
        "allplayers": {
            "76561197960287930": {"name": "alpha", "team": "T"}
        }
    }"#;

    #[tokio::test]
    async fn test_ingest_updates_roster_and_publishes() {
        let state = test_state().await;
        let mut sub = state.broker.subscribe().await.unwrap();

        let status =
            receive_game_status(State(state.clone()), Bytes::from_static(SAMPLE.as_bytes())).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(state.teams.read().await.t.len(), 1);
        assert_eq!(&*state.last_gsi.read().await, SAMPLE.as_bytes());

        let delivered = timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("no broadcast within deadline")
            .expect("broker closed the queue");
        let roster: serde_json::Value = serde_json::from_slice(&delivered).unwrap();
        assert_eq!(roster["T"]["76561197960287930"]["player_name"], "alpha");
    }

    #[tokio::test]
    async fn test_ingest_rejects_garbage_but_retains_it() {
        let state = test_state().await;

        let status =
            receive_game_status(State(state.clone()), Bytes::from_static(b"not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(&*state.last_gsi.read().await, b"not json".as_slice());
        assert!(state.teams.read().await.t.is_empty());
    }

    #[tokio::test]
    async fn test_report_last_gsi_roundtrip() {
        let state = test_state().await;
        *state.last_gsi.write().await = Bytes::from_static(b"{\"x\":1}");

        let body = report_last_gsi(State(state)).await;
        assert_eq!(&body[..], b"{\"x\":1}");
    }
}
