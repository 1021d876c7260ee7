//! Relay configuration loading
//!
//! Two kinds of JSON files configure the relay: the main file (listen
//! addresses and OBS camera servers, `pkm.json` by default) and one player
//! file per team. All parsing is typed; a bad file surfaces as a
//! [`ConfigError`] carrying the offending path instead of killing the
//! process mid-parse.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::gsi::Player;
use crate::steamid::{self, SteamIdError};

/// Errors raised while loading configuration files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid Steam ID '{id}' in {path}: {source}")]
    SteamId {
        path: String,
        id: String,
        #[source]
        source: SteamIdError,
    },
}

/// Listen address of one of the relay's HTTP listeners
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    pub address: String,
    pub port: u16,
}

impl ListenConfig {
    /// `host:port` form accepted by `TcpListener::bind`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// One OBS instance reachable over obs-websocket
#[derive(Debug, Clone, Deserialize)]
pub struct CameraServer {
    pub address: String,
    pub port: u16,
}

impl CameraServer {
    pub fn host(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Top-level relay configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// API listener (GSI ingest and report endpoints)
    pub pkm: ListenConfig,
    /// Push listener (SSE subscribers)
    pub gsi_pusher: ListenConfig,
    /// OBS instances to drive; may be empty
    #[serde(default)]
    pub camera_servers: Vec<CameraServer>,
}

impl RelayConfig {
    /// Load the main configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }
}

/// Camera assignments keyed by normalized SteamID64
pub type PlayerDirectory = BTreeMap<String, Player>;

#[derive(Debug, Deserialize)]
struct TeamFile {
    players: BTreeMap<String, TeamFilePlayer>,
}

#[derive(Debug, Deserialize)]
struct TeamFilePlayer {
    player_name: String,
    place: u32,
}

/// Load one team's player file.
///
/// Keys may use any Steam ID form; every key is normalized to SteamID64. The
/// camera item name is derived as `<team letter><place>`, and `place == 0`
/// marks a player whose feed is never shown.
pub fn load_team(path: &Path, team_letter: char) -> Result<PlayerDirectory, ConfigError> {
    let file: TeamFile = read_json(path)?;

    let mut players = PlayerDirectory::new();
    for (raw_id, entry) in file.players {
        let id = steamid::normalize(&raw_id).map_err(|source| ConfigError::SteamId {
            path: path.display().to_string(),
            id: raw_id.clone(),
            source,
        })?;

        let record = Player {
            camera: format!("{}{}", team_letter, entry.place),
            player_name: entry.player_name,
            place: entry.place,
        };

        tracing::info!(
            steamid = %id,
            name = %record.player_name,
            camera = %record.camera,
            "Player loaded"
        );
        players.insert(id.to_string(), record);
    }

    Ok(players)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let file = File::open(path).map_err(|source| ConfigError::Open {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}
