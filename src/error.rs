//! Crate-level error type

use thiserror::Error;

use crate::broker::BrokerError;
use crate::config::ConfigError;
use crate::obs::ObsError;

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for relay startup and serving
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Obs(#[from] ObsError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
