use std::time::Duration;

use thiserror::Error;

/// Failure of a single transport step (dial, auth or execute).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("authentication rejected")]
    AuthRejected,
}

/// Execute failure that may still carry whatever the server sent before it broke.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct ExecuteError {
    pub partial: Vec<u8>,
    #[source]
    pub source: TransportError,
}

impl ExecuteError {
    pub fn new(source: TransportError) -> Self {
        Self {
            partial: Vec::new(),
            source,
        }
    }

    pub fn with_partial(partial: impl Into<Vec<u8>>, source: TransportError) -> Self {
        Self {
            partial: partial.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum RconError {
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: TransportError,
    },

    #[error("failed to execute the command {command:?}: {source}")]
    Execute {
        command: String,
        partial: Vec<u8>,
        #[source]
        source: TransportError,
    },
}

impl RconError {
    /// Output received before an execute failure. Empty for connect failures.
    pub fn partial_output(&self) -> &[u8] {
        match self {
            RconError::Connect { .. } => &[],
            RconError::Execute { partial, .. } => partial,
        }
    }
}

pub type Result<T> = std::result::Result<T, RconError>;
