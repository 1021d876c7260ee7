//! Best-effort Steam Web API lookups
//!
//! Configured Steam IDs are checked against `GetPlayerSummaries` at startup
//! so typos in team files show up before the match starts. Verification is
//! advisory: without an API key file it is skipped, and any API problem logs
//! and moves on.

use serde::Deserialize;

/// File holding the Steam Web API key, read from the working directory
const API_KEY_FILE: &str = "steam.apikey";

const GET_PLAYER_SUMMARIES: &str =
    "https://api.steampowered.com/ISteamUser/GetPlayerSummaries/v0002/";

#[derive(Debug, Deserialize)]
struct SummariesEnvelope {
    response: SummariesResponse,
}

#[derive(Debug, Deserialize)]
struct SummariesResponse {
    #[serde(default)]
    players: Vec<PlayerSummary>,
}

#[derive(Debug, Deserialize)]
struct PlayerSummary {
    personaname: String,
}

/// Read the API key, if present.
///
/// A missing or unreadable key file disables verification rather than
/// failing startup.
pub fn api_key() -> Option<String> {
    match std::fs::read_to_string(API_KEY_FILE) {
        Ok(key) => Some(key.trim().to_string()),
        Err(e) => {
            tracing::info!(
                file = API_KEY_FILE,
                error = %e,
                "Steam ID verification disabled, no API key"
            );
            None
        }
    }
}

/// Check that `steamid` names exactly one Steam account.
///
/// Never fails the caller: network and decode problems log a warning and
/// report `false`.
pub async fn verify(client: &reqwest::Client, key: &str, steamid: &str) -> bool {
    let result = client
        .get(GET_PLAYER_SUMMARIES)
        .query(&[("key", key), ("steamids", steamid)])
        .send()
        .await;

    let response = match result {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(steamid = steamid, error = %e, "Steam API request failed");
            return false;
        }
    };

    if !response.status().is_success() {
        tracing::warn!(
            steamid = steamid,
            status = %response.status(),
            "Steam API returned an error, ID not verified"
        );
        return false;
    }

    let body: SummariesEnvelope = match response.json().await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(steamid = steamid, error = %e, "Steam API response did not parse");
            return false;
        }
    };

    match body.response.players.as_slice() {
        [] => {
            tracing::warn!(steamid = steamid, "Steam ID not found on Steam");
            false
        }
        [player] => {
            tracing::info!(
                steamid = steamid,
                persona = %player.personaname,
                "Steam ID verified"
            );
            true
        }
        _ => {
            tracing::warn!(steamid = steamid, "Steam returned more than one player record");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_envelope_parses() {
        let body = r#"{"response": {"players": [{"personaname": "alpha", "profileurl": "x"}]}}"#;
        let envelope: SummariesEnvelope = serde_json::from_str(body).unwrap();

        assert_eq!(envelope.response.players.len(), 1);
        assert_eq!(envelope.response.players[0].personaname, "alpha");
    }

    #[test]
    fn test_empty_players_defaults() {
        let envelope: SummariesEnvelope = serde_json::from_str(r#"{"response": {}}"#).unwrap();

        assert!(envelope.response.players.is_empty());
    }
}
