//! Steam ID normalization
//!
//! Team configuration files may name players in any of the four textual Steam
//! ID forms. Everything is normalized to SteamID64, the form GSI payloads use,
//! so roster lookups are a plain string compare.
//!
//! Accepted forms:
//!
//! | Form      | Example               |
//! |-----------|-----------------------|
//! | SteamID   | `STEAM_1:1:12345`     |
//! | SteamID3  | `[U:1:24691]`, `U:1:24691` (individual accounts only) |
//! | SteamID32 | `24691` (fewer than 11 digits) |
//! | SteamID64 | `76561197960290419`   |

use std::fmt;

use thiserror::Error;

/// Offset between a 32-bit account ID and its SteamID64 form
const STEAM64_BASE: u64 = 76_561_197_960_265_728;

/// Errors raised while normalizing a Steam ID
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SteamIdError {
    #[error("empty Steam ID")]
    Empty,
    #[error("malformed SteamID '{0}'")]
    MalformedSteamId(String),
    #[error("malformed SteamID3 '{0}', only individual accounts (U) are accepted")]
    MalformedSteamId3(String),
    #[error("'{0}' looks like a SteamID32 or SteamID64 but is not a valid number")]
    MalformedNumeric(String),
}

/// A normalized 64-bit Steam ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SteamId64(pub u64);

impl fmt::Display for SteamId64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize any accepted Steam ID form to SteamID64.
///
/// Dispatch is on the leading character: `S` for the classic form, `U` or `[`
/// for SteamID3, anything else must be numeric.
pub fn normalize(raw: &str) -> Result<SteamId64, SteamIdError> {
    let trimmed = raw.trim();

    match trimmed.chars().next().map(|c| c.to_ascii_uppercase()) {
        None => Err(SteamIdError::Empty),
        Some('S') => parse_classic(trimmed),
        Some('U') | Some('[') => parse_id3(trimmed),
        Some(_) => parse_numeric(trimmed),
    }
}

/// `STEAM_X:Y:Z` → `BASE + Z*2 + Y`
fn parse_classic(raw: &str) -> Result<SteamId64, SteamIdError> {
    let malformed = || SteamIdError::MalformedSteamId(raw.to_string());

    let rest = raw.strip_prefix("STEAM_").ok_or_else(malformed)?;
    let mut parts = rest.splitn(3, ':');

    let _universe: u64 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(malformed)?;
    let y: u64 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .filter(|y| *y <= 1)
        .ok_or_else(malformed)?;
    let z: u64 = parts
        .next()
        .and_then(|p| p.parse().ok())
        .ok_or_else(malformed)?;

    Ok(SteamId64(STEAM64_BASE + z * 2 + y))
}

/// `[U:1:N]` or `U:1:N` → `BASE + N`
fn parse_id3(raw: &str) -> Result<SteamId64, SteamIdError> {
    let malformed = || SteamIdError::MalformedSteamId3(raw.to_string());

    let inner = raw.trim_start_matches('[').trim_end_matches(']');
    let mut parts = inner.splitn(3, ':');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(kind), Some("1"), Some(account)) if kind.eq_ignore_ascii_case("u") => {
            let account: u32 = account.parse().map_err(|_| malformed())?;
            Ok(SteamId64(STEAM64_BASE + u64::from(account)))
        }
        _ => Err(malformed()),
    }
}

/// Bare number: fewer than 11 digits is a SteamID32 account ID, anything
/// longer is taken as an already-normalized SteamID64
fn parse_numeric(raw: &str) -> Result<SteamId64, SteamIdError> {
    let value: u64 = raw
        .parse()
        .map_err(|_| SteamIdError::MalformedNumeric(raw.to_string()))?;

    if raw.len() < 11 {
        let account =
            u32::try_from(value).map_err(|_| SteamIdError::MalformedNumeric(raw.to_string()))?;
        Ok(SteamId64(STEAM64_BASE + u64::from(account)))
    } else {
        Ok(SteamId64(value))
    }
}
