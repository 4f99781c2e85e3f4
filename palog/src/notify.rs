use chrono::{DateTime, FixedOffset};
use palog_rcon::{Dialer, RconClient};
use tracing::{error, info, warn};

use crate::error::NotifyError;
use crate::helpers::in_status_window;
use crate::render;
use crate::romanize::Romanizer;

/// Broadcast attempts before a notification is given up.
pub const BROADCAST_ATTEMPTS: usize = 10;

/// Sanitizes messages and broadcasts them with bounded retries.
pub struct Notifier<R> {
    romanizer: Option<R>,
}

impl<R: Romanizer> Notifier<R> {
    /// `None` disables romanization.
    pub fn new(romanizer: Option<R>) -> Self {
        Self { romanizer }
    }

    /// Make `message` safe for the `Broadcast` command.
    pub async fn sanitize(&self, message: &str) -> String {
        let mut text = render::strip_nul_markers(message);
        if let Some(romanizer) = &self.romanizer {
            text = romanizer.romanize(&text).await;
        }
        render::make_broadcast_safe(&text)
    }

    /// Sanitize and broadcast `message`, stopping at the first success.
    pub async fn notify<D: Dialer>(
        &self,
        client: &RconClient<D>,
        message: &str,
    ) -> Result<(), NotifyError> {
        let message = self.sanitize(message).await;

        let mut last_error = None;
        for attempt in 1..=BROADCAST_ATTEMPTS {
            match client.broadcast(&message).await {
                Ok(()) => {
                    info!(broadcast = %message, attempt, "sent broadcast");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, attempt, "failed to broadcast");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(source) => {
                let err = NotifyError::BroadcastExhausted {
                    attempts: BROADCAST_ATTEMPTS,
                    source,
                };
                error!(error = %err, broadcast = %message, "giving up on broadcast");
                Err(err)
            }
            None => Ok(()),
        }
    }
}

/// Latch that lets one status report through per :00 / :30 window.
#[derive(Debug, Default)]
pub struct StatusGate {
    reported: bool,
}

impl StatusGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a report is due now. Claims the window when it is.
    pub fn claim(&mut self, t: &DateTime<FixedOffset>) -> bool {
        if !in_status_window(t) {
            self.reported = false;
            return false;
        }
        if self.reported {
            return false;
        }
        self.reported = true;
        true
    }
}
