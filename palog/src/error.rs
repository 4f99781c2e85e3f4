use palog_rcon::RconError;
use thiserror::Error;

/// Notification delivery error
#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("failed to broadcast after {attempts} attempts: {source}")]
  BroadcastExhausted {
    attempts: usize,
    #[source]
    source: RconError,
  },
}

/// Startup configuration error
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
  #[error("{0} environment variable is required")]
  Missing(&'static str),

  #[error("failed to parse {var} as a duration: {value:?}")]
  InvalidDuration { var: &'static str, value: String },

  #[error("unknown time zone in {var} (expected an IANA name such as \"Asia/Tokyo\"): {value:?}")]
  InvalidTimezone { var: &'static str, value: String },

  #[error("failed to parse {var} as a number: {value:?}")]
  InvalidNumber { var: &'static str, value: String },
}
