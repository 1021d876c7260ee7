//! gsi-relay: CS:GO Game State Integration relay
//!
//! A single-process server that takes GSI POSTs from one observer client,
//! keeps a live team roster, pushes every roster update to any number of
//! Server-Sent Events subscribers, and switches player-camera scene items on
//! remote OBS instances as the observed player changes.
//!
//! ```text
//! observer ──POST /──► api listener ──publish──► broker ──┬──► SSE client
//!     │                    │                              ├──► SSE client
//!     │                    └──switch_player──► OBS (ws)   └──► ...
//!     └── /state /players /lastgsijson (reports)
//! ```
//!
//! The broadcast core lives in [`broker`]; everything else is sequential
//! glue around it.

pub mod broker;
pub mod config;
pub mod error;
pub mod gsi;
pub mod obs;
pub mod server;
pub mod steam;
pub mod steamid;

pub use error::{Error, Result};
