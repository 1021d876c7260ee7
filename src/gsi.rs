//! CS:GO Game State Integration payload model
//!
//! The observer client POSTs a large JSON document on every game tick. Only
//! two sections matter to the relay: `player` (who the observer camera is on)
//! and `allplayers` (the scoreboard, keyed by SteamID64). Everything else is
//! ignored, and either section may be absent depending on the game phase.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};

/// Team side as reported by GSI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    T,
    CT,
    /// Spectators and anything a newer game build might add
    Other,
}

impl<'de> Deserialize<'de> for Side {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Unknown sides must not fail the whole payload
        let side = String::deserialize(deserializer)?;
        Ok(match side.as_str() {
            "T" => Side::T,
            "CT" => Side::CT,
            _ => Side::Other,
        })
    }
}

/// Player record as exposed on the wire (`/state`, `/players`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub player_name: String,
    #[serde(default)]
    pub camera: String,
    #[serde(default)]
    pub place: u32,
}

/// The player currently on the observer's camera
#[derive(Debug, Clone, Deserialize)]
pub struct ObservedPlayer {
    pub steamid: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One scoreboard entry from `allplayers`
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreboardPlayer {
    pub name: String,
    #[serde(default)]
    pub team: Option<Side>,
}

/// The subset of a GSI POST the relay consumes
#[derive(Debug, Deserialize)]
pub struct GsiPayload {
    #[serde(default)]
    pub player: Option<ObservedPlayer>,
    #[serde(default)]
    pub allplayers: Option<HashMap<String, ScoreboardPlayer>>,
}

impl GsiPayload {
    /// Parse a raw POST body
    pub fn parse(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    /// SteamID64 of the observed player, if the payload carries one
    pub fn observed_steamid(&self) -> Option<&str> {
        self.player.as_ref().map(|p| p.steamid.as_str())
    }
}

/// Roster of both sides, folded together from successive GSI payloads.
///
/// `BTreeMap` keeps the serialized output stable across ticks.
#[derive(Debug, Default, Serialize)]
pub struct TeamState {
    #[serde(rename = "T")]
    pub t: BTreeMap<String, Player>,
    #[serde(rename = "CT")]
    pub ct: BTreeMap<String, Player>,
}

impl TeamState {
    /// Fold one payload's scoreboard into the roster.
    ///
    /// Payloads without `allplayers` (freezetime, menus) leave the roster
    /// untouched. Players who switch sides appear under their new side; stale
    /// entries from the old side are kept, matching the original tool.
    pub fn apply(&mut self, payload: &GsiPayload) {
        let Some(all) = &payload.allplayers else {
            return;
        };

        for (steamid, entry) in all {
            let record = Player {
                player_name: entry.name.clone(),
                camera: String::new(),
                place: 0,
            };

            match entry.team {
                Some(Side::T) => {
                    self.t.insert(steamid.clone(), record);
                }
                Some(Side::CT) => {
                    self.ct.insert(steamid.clone(), record);
                }
                _ => {}
            }
        }
    }
}
