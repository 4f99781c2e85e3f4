mod error;
mod models;
pub mod packet;
pub mod parse;
pub mod transport;

pub use error::{ExecuteError, RconError, Result, TransportError};
pub use models::Player;
pub use transport::{Dialer, Session, TcpDialer, TcpSession};

use std::time::Duration;
use tracing::{debug, warn};

/// Command that lists online players.
pub const SHOW_PLAYERS: &str = "ShowPlayers";

/// Default dial timeout and execute deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// RCON client for a Palworld dedicated server.
///
/// Palworld's RCON is unstable, so connections are never reused: every
/// command dials a fresh session and closes it before returning.
#[derive(Debug, Clone)]
pub struct RconClient<D> {
    dialer: D,
    endpoint: String,
    password: String,
    timeout: Duration,
}

impl<D: Dialer> RconClient<D> {
    pub fn new(dialer: D, endpoint: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            dialer,
            endpoint: endpoint.into(),
            password: password.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set both the dial timeout and the execute deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run one command on a fresh connection.
    ///
    /// Returns the raw response body with its trailing NUL padding stripped.
    /// An empty output with no error is valid.
    pub async fn execute(&self, command: &str) -> Result<Vec<u8>> {
        let mut session = self
            .dialer
            .dial(&self.endpoint, &self.password, self.timeout)
            .await
            .map_err(|source| RconError::Connect {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let result = session.execute(command, self.timeout).await;
        session.close().await;

        match result {
            Ok(output) => Ok(trim_nul_padding(output)),
            Err(e) => Err(RconError::Execute {
                command: command.to_string(),
                partial: trim_nul_padding(e.partial),
                source: e.source,
            }),
        }
    }

    /// Fetch and parse the online player list.
    ///
    /// `ShowPlayers` often times out while still delivering a usable payload,
    /// so an execute failure with non-empty partial output is not an error.
    pub async fn get_players(&self) -> Result<Vec<Player>> {
        let raw = match self.execute(SHOW_PLAYERS).await {
            Ok(raw) => raw,
            Err(e) if !e.partial_output().is_empty() => {
                warn!(
                    error = %e,
                    received = e.partial_output().len(),
                    "player list incomplete, using partial output"
                );
                e.partial_output().to_vec()
            }
            Err(e) => return Err(e),
        };

        let players = parse::parse_players(&raw);
        debug!(count = players.len(), "fetched player list");
        Ok(players)
    }

    /// Broadcast a message to everyone on the server.
    pub async fn broadcast(&self, message: &str) -> Result<()> {
        self.execute(&format!("Broadcast {}", message)).await?;
        Ok(())
    }
}

/// Strip the trailing run of `0x00` bytes the server pads responses with.
pub fn trim_nul_padding(mut output: Vec<u8>) -> Vec<u8> {
    let len = output.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    output.truncate(len);
    output
}
