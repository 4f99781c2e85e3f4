pub mod config;
pub mod error;
pub mod helpers;
pub mod metrics;
pub mod notify;
pub mod presence;
pub mod render;
pub mod romanize;
pub mod scheduler;
pub mod snapshot;

pub use config::Config;
pub use error::{ConfigError, NotifyError};
pub use metrics::{FreeCommand, HostMetrics, MemInfo};
pub use notify::{BROADCAST_ATTEMPTS, Notifier, StatusGate};
pub use presence::{CONFIRMATION_THRESHOLD, PresenceEngine, PresenceEvent};
pub use romanize::{Romanizer, ShellRomanizer};
pub use scheduler::{Monitor, MonitorSettings, TickOutcome};
pub use snapshot::{Snapshot, SnapshotHistory};

use palog_rcon::{RconClient, TcpDialer};

/// Build a monitor that talks to a real server with the given configuration
pub fn create_monitor(config: &Config) -> Monitor<TcpDialer, ShellRomanizer, FreeCommand> {
    let client = RconClient::new(TcpDialer, &config.rcon_endpoint, &config.rcon_password)
        .with_timeout(config.timeout);
    let romanizer = config.romanize.then(ShellRomanizer::default);

    Monitor::new(
        client,
        Notifier::new(romanizer),
        FreeCommand,
        MonitorSettings {
            interval: config.interval,
            timezone: config.timezone,
            max_players: config.max_players,
        },
    )
}
