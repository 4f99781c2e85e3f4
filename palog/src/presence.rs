//! Presence reconciliation.
//!
//! Turns the noisy per-tick player list into confirmed join/leave events. A
//! change must be seen on [`CONFIRMATION_THRESHOLD`] consecutive ticks before it
//! is confirmed, and players whose name changed are matched across ticks by
//! uid and steam id. A confirmed player seen under a new name for as many ticks
//! is renamed in place.

use std::collections::{BTreeMap, BTreeSet};

use palog_rcon::Player;
use tracing::info;

use crate::snapshot::{Snapshot, SnapshotHistory, steam_key, uid_key};

/// Consecutive ticks a join or leave must be observed before it is confirmed.
pub const CONFIRMATION_THRESHOLD: u32 = 3;

/// Pending count at which a simultaneous join and leave is treated as the
/// client-side nickname bug.
const NICKNAME_BUG_COUNT: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum PresenceEvent {
    /// Join confirmed. `online` is the roster size after adding the player.
    Joined { player: Player, online: usize },
    /// Leave confirmed. `online` is the roster size after removing the player.
    Left { player: Player, online: usize },
    /// A confirmed player now goes by another name, or a leaving player was
    /// silently replaced by a newcomer.
    Renamed { from: String, to: Player },
}

/// Confirmed online players plus the pending evidence for changes.
#[derive(Debug, Default)]
pub struct PresenceEngine {
    roster: BTreeMap<String, Player>,
    appearances: BTreeMap<String, u32>,
    disappearances: BTreeMap<String, u32>,
    renames: BTreeMap<String, u32>,
    history: SnapshotHistory,
    seeded: bool,
}

impl PresenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Confirmed online players, by name.
    pub fn roster(&self) -> &BTreeMap<String, Player> {
        &self.roster
    }

    pub fn online_names(&self) -> Vec<&str> {
        self.roster.keys().map(String::as_str).collect()
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn appearances(&self, name: &str) -> u32 {
        self.appearances.get(name).copied().unwrap_or(0)
    }

    pub fn disappearances(&self, name: &str) -> u32 {
        self.disappearances.get(name).copied().unwrap_or(0)
    }

    /// Ticks `name` has been seen as the new name of a confirmed player.
    pub fn pending_rename(&self, name: &str) -> u32 {
        self.renames.get(name).copied().unwrap_or(0)
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    /// Feed one tick's player list and return the confirmed events.
    ///
    /// The first call only seeds the roster and never returns events.
    pub fn observe(&mut self, players: &[Player]) -> Vec<PresenceEvent> {
        let current = Snapshot::new(players);

        if !self.seeded {
            self.roster = current.by_name.clone();
            self.history.push(current);
            self.seeded = true;
            info!(online = self.roster.len(), "roster seeded");
            return Vec::new();
        }

        let previous = self.history.current().cloned().unwrap_or_default();

        let mut events = Vec::new();
        let mut seen = Seen::default();

        self.detect_joins(&current, &previous, &mut seen, &mut events);
        self.detect_leaves(&current, &mut seen.disappeared, &mut events);

        // A gap of one tick restarts the count.
        self.appearances.retain(|name, _| seen.appeared.contains(name));
        self.disappearances.retain(|name, _| seen.disappeared.contains(name));
        self.renames.retain(|name, _| seen.renamed.contains(name));

        self.history.push(current);
        events
    }

    fn detect_joins(
        &mut self,
        current: &Snapshot,
        previous: &Snapshot,
        seen: &mut Seen,
        events: &mut Vec<PresenceEvent>,
    ) {
        for (name, player) in &current.by_name {
            if self.roster.contains_key(name) {
                continue;
            }

            // Same person under a new name: the previous tick still knows them
            // by their old one.
            let identity = previous.resolve_name(player).to_string();

            if self.appearances(name) == NICKNAME_BUG_COUNT {
                if let Some(replaced) = self.pending_leave_at(NICKNAME_BUG_COUNT) {
                    info!(from = %replaced, to = %player.name, "nickname changed");
                    self.appearances.remove(name);
                    self.appearances.remove(&identity);
                    self.disappearances.remove(&replaced);
                    self.roster.remove(&replaced);
                    self.roster.insert(player.name.clone(), player.clone());
                    events.push(PresenceEvent::Renamed {
                        from: replaced,
                        to: player.clone(),
                    });
                    continue;
                }
            }

            if let Some(known) = self.known_as(player, &identity) {
                // Both names listed at once: wait for the old one to go.
                if !current.contains_name(&known) {
                    self.count_rename(known, player, seen, events);
                }
                continue;
            }

            self.disappearances.remove(&identity);
            let count = self.appearances.entry(identity.clone()).or_insert(0);
            *count += 1;
            let count = *count;
            seen.appeared.insert(identity.clone());
            info!(player = %identity, count, "player appearance");

            if count >= CONFIRMATION_THRESHOLD {
                self.appearances.remove(&identity);
                self.roster.insert(player.name.clone(), player.clone());
                info!(player = %player.name, uid = %player.player_uid, "player joined");
                events.push(PresenceEvent::Joined {
                    player: player.clone(),
                    online: self.roster.len(),
                });
            }
        }
    }

    fn detect_leaves(
        &mut self,
        current: &Snapshot,
        disappeared: &mut BTreeSet<String>,
        events: &mut Vec<PresenceEvent>,
    ) {
        let roster: Vec<(String, Player)> = self
            .roster
            .iter()
            .map(|(name, player)| (name.clone(), player.clone()))
            .collect();

        for (name, player) in roster {
            if current.contains_name(&player.name) {
                continue;
            }

            // Still online if the current tick knows them under another name.
            let identity = current.resolve_name(&player).to_string();
            if current.contains_name(&identity) {
                continue;
            }

            self.appearances.remove(&identity);
            let count = self.disappearances.entry(identity.clone()).or_insert(0);
            *count += 1;
            let count = *count;
            disappeared.insert(identity.clone());
            info!(player = %identity, count, "player disappearance");

            if count >= CONFIRMATION_THRESHOLD {
                self.disappearances.remove(&identity);
                self.roster.remove(&name);
                info!(player = %name, uid = %player.player_uid, "player left");
                events.push(PresenceEvent::Left {
                    player,
                    online: self.roster.len(),
                });
            }
        }
    }

    fn count_rename(
        &mut self,
        known: String,
        player: &Player,
        seen: &mut Seen,
        events: &mut Vec<PresenceEvent>,
    ) {
        let count = self.renames.entry(player.name.clone()).or_insert(0);
        *count += 1;
        let count = *count;
        seen.renamed.insert(player.name.clone());
        info!(from = %known, to = %player.name, count, "player rename");

        if count >= CONFIRMATION_THRESHOLD {
            self.renames.remove(&player.name);
            self.roster.remove(&known);
            self.roster.insert(player.name.clone(), player.clone());
            info!(from = %known, to = %player.name, "player renamed");
            events.push(PresenceEvent::Renamed {
                from: known,
                to: player.clone(),
            });
        }
    }

    /// First pending leave (by name) whose count is exactly `count`.
    fn pending_leave_at(&self, count: u32) -> Option<String> {
        self.disappearances
            .iter()
            .find(|(_, c)| **c == count)
            .map(|(name, _)| name.clone())
    }

    /// Roster name of the confirmed player this one already is, if any.
    ///
    /// Matches the resolved identity first, then a confirmed player carrying the
    /// same uid or steam id.
    fn known_as(&self, player: &Player, identity: &str) -> Option<String> {
        if self.roster.contains_key(identity) {
            return Some(identity.to_string());
        }

        let uid = uid_key(player);
        let steam_id = steam_key(player);
        if uid.is_none() && steam_id.is_none() {
            return None;
        }
        self.roster
            .iter()
            .find(|(_, known)| {
                (uid.is_some() && uid_key(known) == uid)
                    || (steam_id.is_some() && steam_key(known) == steam_id)
            })
            .map(|(name, _)| name.clone())
    }
}

/// Keys whose counters moved during the current tick.
#[derive(Default)]
struct Seen {
    appeared: BTreeSet<String>,
    disappeared: BTreeSet<String>,
    renamed: BTreeSet<String>,
}
