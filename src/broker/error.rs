//! Broker error types

use thiserror::Error;

/// Error type for broker operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrokerError {
    /// The broker's event loop has stopped and no longer accepts commands
    #[error("broker is shut down")]
    Shutdown,
}
