//! The polling loop: fetch, reconcile, notify, sleep.

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use palog_rcon::{Dialer, RconClient};
use tracing::{debug, error, info};

use crate::helpers::now_in;
use crate::metrics::HostMetrics;
use crate::notify::{Notifier, StatusGate};
use crate::presence::{PresenceEngine, PresenceEvent};
use crate::render;
use crate::romanize::Romanizer;

/// Scheduling settings for [`Monitor`].
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub interval: Duration,
    pub timezone: Tz,
    pub max_players: usize,
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The player list could not be fetched; nothing changed.
    Skipped,
    /// First successful fetch; roster seeded without notifications.
    Seeded,
    Reconciled {
        events: Vec<PresenceEvent>,
        status_reported: bool,
    },
}

/// Owns all per-process state and drives one tick at a time.
pub struct Monitor<D, R, M> {
    client: RconClient<D>,
    notifier: Notifier<R>,
    metrics: M,
    engine: PresenceEngine,
    status: StatusGate,
    settings: MonitorSettings,
}

impl<D, R, M> Monitor<D, R, M>
where
    D: Dialer,
    R: Romanizer,
    M: HostMetrics,
{
    pub fn new(
        client: RconClient<D>,
        notifier: Notifier<R>,
        metrics: M,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            client,
            notifier,
            metrics,
            engine: PresenceEngine::new(),
            status: StatusGate::new(),
            settings,
        }
    }

    pub fn engine(&self) -> &PresenceEngine {
        &self.engine
    }

    /// Poll forever.
    pub async fn run(&mut self) {
        info!(
            interval = ?self.settings.interval,
            endpoint = %self.client.endpoint(),
            "monitoring players"
        );
        loop {
            let now = now_in(self.settings.timezone);
            self.tick(now).await;
            tokio::time::sleep(self.settings.interval).await;
        }
    }

    /// Run one fetch/reconcile/notify cycle at wall-clock time `now`.
    pub async fn tick(&mut self, now: DateTime<FixedOffset>) -> TickOutcome {
        let players = match self.client.get_players().await {
            Ok(players) => players,
            Err(e) => {
                error!(error = %e, "failed to get players");
                return TickOutcome::Skipped;
            }
        };

        if tracing::enabled!(tracing::Level::DEBUG) {
            match serde_json::to_string(&players) {
                Ok(json) => debug!(players = %json, "current players"),
                Err(e) => debug!(error = %e, "failed to serialize players"),
            }
        }

        if !self.engine.is_seeded() {
            self.engine.observe(&players);
            return TickOutcome::Seeded;
        }

        let events = self.engine.observe(&players);
        for event in &events {
            self.announce(event, &now).await;
        }

        let status_reported = self.report_status(&now).await;

        TickOutcome::Reconciled {
            events,
            status_reported,
        }
    }

    async fn announce(&self, event: &PresenceEvent, now: &DateTime<FixedOffset>) {
        let capacity = self.settings.max_players;
        let message = match event {
            PresenceEvent::Joined { player, online } => {
                render::joined_message(now, player, *online, capacity)
            }
            PresenceEvent::Left { player, online } => {
                render::left_message(now, player, *online, capacity)
            }
            PresenceEvent::Renamed { .. } => return,
        };

        if let Err(e) = self.notifier.notify(&self.client, &message).await {
            debug!(error = %e, "dropping presence notification");
        }
    }

    /// Send the status and online-list broadcasts if this tick opens a window.
    async fn report_status(&mut self, now: &DateTime<FixedOffset>) -> bool {
        if !self.status.claim(now) {
            return false;
        }

        let mem = self.metrics.read().await;
        info!(used = mem.used, total = mem.total, "mem");

        let online = self.engine.roster().len();
        let status = render::status_message(now, online, self.settings.max_players, &mem);
        if let Err(e) = self.notifier.notify(&self.client, &status).await {
            debug!(error = %e, "skipping online list");
            return true;
        }

        let names = render::online_message(self.engine.online_names());
        if let Err(e) = self.notifier.notify(&self.client, &names).await {
            debug!(error = %e, "dropping online list");
        }
        true
    }
}
