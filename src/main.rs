//! gsi-relay binary: configuration, wiring and lifecycle

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use clap::Parser;
use tokio::sync::{Mutex, RwLock};
use tracing_subscriber::EnvFilter;

use gsi_relay::broker::{Broker, BrokerConfig};
use gsi_relay::config::{self, PlayerDirectory, RelayConfig};
use gsi_relay::gsi::TeamState;
use gsi_relay::obs::ObsController;
use gsi_relay::server::{self, AppState};
use gsi_relay::steam;

/// CS:GO game state relay: GSI ingest, SSE fan-out, OBS camera switching
#[derive(Debug, Parser)]
#[command(name = "gsi-relay", version)]
struct Args {
    /// JSON configuration file for general settings
    #[arg(long = "conf", default_value = "pkm.json")]
    conf: PathBuf,

    /// JSON player file for team A
    #[arg(short = 'A', long = "team-a")]
    team_a: Option<PathBuf>,

    /// JSON player file for team B
    #[arg(short = 'B', long = "team-b")]
    team_b: Option<PathBuf>,

    /// Run locally without connecting to OBS or sending control commands
    #[arg(long = "test")]
    test: bool,
}

#[tokio::main]
async fn main() -> gsi_relay::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let relay_config = RelayConfig::load(&args.conf)?;

    let mut players = PlayerDirectory::new();
    if let Some(path) = &args.team_a {
        players.extend(config::load_team(path, 'A')?);
    }
    if let Some(path) = &args.team_b {
        players.extend(config::load_team(path, 'B')?);
    }
    tracing::info!(players = players.len(), "Player camera assignments loaded");

    if let Some(key) = steam::api_key() {
        let client = reqwest::Client::new();
        for steamid in players.keys() {
            steam::verify(&client, &key, steamid).await;
        }
    }

    let obs = ObsController::connect(&relay_config.camera_servers, players.clone(), args.test).await?;

    let (_core_task, broker) = Broker::spawn(BrokerConfig::default());

    let state = AppState {
        broker,
        teams: Arc::new(RwLock::new(TeamState::default())),
        last_gsi: Arc::new(RwLock::new(Bytes::new())),
        players: Arc::new(players),
        obs: Arc::new(Mutex::new(obs)),
    };

    let api_addr = relay_config.pkm.addr();
    let push_addr = relay_config.gsi_pusher.addr();
    tracing::info!(api = %api_addr, push = %push_addr, "gsi-relay starting");

    server::run_until(&api_addr, &push_addr, state, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}
