//! Per-tick views of the player list, keyed by name, uid and steam id.

use std::collections::{BTreeMap, HashMap};

use palog_rcon::Player;

/// Value the server reports for an id it does not know.
pub const UNKNOWN_ID: &str = "00000000";

/// Escaped NUL the server sometimes leaves inside ids.
pub const NUL_MARKER: &str = "\\x00";

/// Shortest player uid trusted as a lookup key.
pub const MIN_UID_LEN: usize = 9;

/// Shortest player uid for which the steam id is trusted as a lookup key.
pub const MIN_UID_LEN_FOR_STEAM_ID: usize = 12;

/// Key used to index a player by name, if usable
///
/// Rules:
/// - Name cannot be empty
/// - Steam id cannot be the unknown sentinel
pub fn name_key(player: &Player) -> Option<&str> {
    if player.name.is_empty() || player.steam_id == UNKNOWN_ID {
        return None;
    }
    Some(&player.name)
}

/// Key used to index a player by uid, if usable
///
/// Rules:
/// - Neither id can be the unknown sentinel
/// - Uid must be at least 9 characters and contain no NUL marker
pub fn uid_key(player: &Player) -> Option<&str> {
    let uid = &player.player_uid;
    if uid == UNKNOWN_ID
        || player.steam_id == UNKNOWN_ID
        || uid.chars().count() < MIN_UID_LEN
        || uid.contains(NUL_MARKER)
    {
        return None;
    }
    Some(uid)
}

/// Key used to index a player by steam id, if usable
///
/// Rules:
/// - Steam id cannot be empty, the unknown sentinel, or contain a NUL marker
/// - Uid must be at least 12 characters
pub fn steam_key(player: &Player) -> Option<&str> {
    let steam_id = &player.steam_id;
    if steam_id.is_empty()
        || steam_id == UNKNOWN_ID
        || steam_id.contains(NUL_MARKER)
        || player.player_uid.chars().count() < MIN_UID_LEN_FOR_STEAM_ID
    {
        return None;
    }
    Some(steam_id)
}

/// Everything observed on one tick. Last write wins on key collisions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub by_name: BTreeMap<String, Player>,
    pub by_uid: HashMap<String, Player>,
    pub by_steam_id: HashMap<String, Player>,
}

impl Snapshot {
    pub fn new(players: &[Player]) -> Self {
        let mut snapshot = Self::default();
        for player in players {
            if let Some(name) = name_key(player) {
                snapshot.by_name.insert(name.to_string(), player.clone());
            }
            if let Some(uid) = uid_key(player) {
                snapshot.by_uid.insert(uid.to_string(), player.clone());
            }
            if let Some(steam_id) = steam_key(player) {
                snapshot.by_steam_id.insert(steam_id.to_string(), player.clone());
            }
        }
        snapshot
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Name this snapshot knows `player` by, matched on secondary ids.
    ///
    /// The steam id match is applied after the uid match and wins over it.
    pub fn resolve_name<'a>(&'a self, player: &'a Player) -> &'a str {
        let mut name = player.name.as_str();
        if let Some(known) = self.by_uid.get(&player.player_uid) {
            name = &known.name;
        }
        if let Some(known) = self.by_steam_id.get(&player.steam_id) {
            name = &known.name;
        }
        name
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// The current snapshot plus the two before it.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHistory {
    current: Option<Snapshot>,
    previous: Option<Snapshot>,
    before_previous: Option<Snapshot>,
}

impl SnapshotHistory {
    /// Roll the window forward by one tick.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.before_previous = self.previous.take();
        self.previous = self.current.replace(snapshot);
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    pub fn before_previous(&self) -> Option<&Snapshot> {
        self.before_previous.as_ref()
    }
}
