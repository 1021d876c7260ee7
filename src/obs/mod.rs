//! OBS remote control
//!
//! Drives scene-item visibility on every configured OBS instance over the
//! obs-websocket 4.x protocol. Camera items are named `cam1`..`cam10` and all
//! live in one scene. Item names are unique across instances, so every
//! command fans out to every server; servers that do not own the item answer
//! with an error that is ignored.

pub mod command;

use futures::SinkExt;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::{CameraServer, PlayerDirectory};
use command::SetSceneItemProperties;

/// Number of camera slots cleared on connect
const CAMERA_SLOTS: u32 = 10;

/// Errors raised while setting up OBS control
#[derive(Debug, Error)]
pub enum ObsError {
    #[error("connection to OBS server {host} failed: {source}")]
    Connect {
        host: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },
}

/// One live obs-websocket connection
struct ObsServer {
    host: String,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

/// Camera switching across all configured OBS servers.
///
/// Tracks the previously observed player so a camera change shows the new
/// feed before hiding the old one, keeping the scene populated throughout.
pub struct ObsController {
    servers: Vec<ObsServer>,
    players: PlayerDirectory,
    previous_sid: Option<String>,
    message_id: u64,
    test_only: bool,
}

impl ObsController {
    /// Connect to every configured server and hide all camera slots.
    ///
    /// In test mode nothing is connected and later commands are logged
    /// instead of sent, so the relay can run without live OBS instances.
    pub async fn connect(
        servers: &[CameraServer],
        players: PlayerDirectory,
        test_only: bool,
    ) -> Result<Self, ObsError> {
        let mut controller = Self {
            servers: Vec::new(),
            players,
            previous_sid: None,
            message_id: 0,
            test_only,
        };

        if test_only {
            tracing::info!("Test mode: OBS control commands will not be sent");
            return Ok(controller);
        }

        for server in servers {
            let host = server.host();
            let url = format!("ws://{host}/");

            let (socket, _) = connect_async(url.as_str())
                .await
                .map_err(|source| ObsError::Connect {
                    host: host.clone(),
                    source,
                })?;

            tracing::info!(host = %host, "Connected to OBS server");
            controller.servers.push(ObsServer { host, socket });
        }

        for slot in 1..=CAMERA_SLOTS {
            controller
                .set_camera_visibility(&format!("cam{slot}"), false)
                .await;
        }
        tracing::info!("All camera feeds hidden");

        Ok(controller)
    }

    /// Point the broadcast at `steamid`'s camera.
    ///
    /// An unknown ID hides every camera; observing the same player again is
    /// a no-op.
    pub async fn switch_player(&mut self, steamid: &str) {
        let Some(current) = self.players.get(steamid).cloned() else {
            tracing::warn!(
                steamid = steamid,
                "No camera assignment for observed player, hiding all feeds"
            );
            self.hide_all_cameras().await;
            self.previous_sid = Some("0".to_string());
            return;
        };

        tracing::debug!(camera = %current.camera, "Selected player camera");

        if self.previous_sid.is_none() {
            // First switch of the match: clear the scene so no stale feed
            // doubles up with the one about to be shown
            self.hide_all_cameras().await;
        }

        if self.previous_sid.as_deref() == Some(steamid) {
            return;
        }

        let previous_camera = self
            .previous_sid
            .as_ref()
            .and_then(|sid| self.players.get(sid))
            .map(|p| p.camera.clone());

        tracing::info!(
            from = self.previous_sid.as_deref().unwrap_or("-"),
            to = steamid,
            "Observed player changed"
        );

        // New feed first; if the new camera sorts before the old one the
        // visible cut happens on the hide
        self.set_camera_visibility(&current.camera, true).await;
        if let Some(camera) = previous_camera {
            self.set_camera_visibility(&camera, false).await;
        }

        self.previous_sid = Some(steamid.to_string());
    }

    /// Hide every configured camera feed
    pub async fn hide_all_cameras(&mut self) {
        let cameras: Vec<String> = self.players.values().map(|p| p.camera.clone()).collect();
        for camera in cameras {
            self.set_camera_visibility(&camera, false).await;
        }
    }

    /// Toggle one scene item on every server.
    ///
    /// Write failures are logged per server and do not abort the fan-out.
    async fn set_camera_visibility(&mut self, camera: &str, visible: bool) {
        self.message_id += 1;
        let command = SetSceneItemProperties::visibility(self.message_id, camera, visible);

        let json = match serde_json::to_string(&command) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "OBS command serialization failed");
                return;
            }
        };

        if self.test_only {
            tracing::debug!(command = %json, "Test mode, OBS command not sent");
            return;
        }

        for server in &mut self.servers {
            if let Err(e) = server.socket.send(Message::text(json.clone())).await {
                tracing::warn!(host = %server.host, error = %e, "OBS command write failed");
            }
        }
    }
}
