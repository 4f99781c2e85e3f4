//! Broadcast message text.
//!
//! This module handles:
//! - Formatting join/leave/status messages
//! - Making text safe for the `Broadcast` command, which splits on spaces
//!   and mangles anything outside single-byte characters

use chrono::{DateTime, FixedOffset};
use palog_rcon::Player;

use crate::helpers::{clock, date_clock, is_top_of_hour};
use crate::metrics::MemInfo;
use crate::snapshot::NUL_MARKER;

/// Substitute for characters that are not a single byte in UTF-8.
pub const PLACEHOLDER: char = '?';

/// `[HH:MM]player-joined:<name>(<online>/<capacity>)`
pub fn joined_message(
    t: &DateTime<FixedOffset>,
    player: &Player,
    online: usize,
    capacity: usize,
) -> String {
    format!(
        "[{}]player-joined:{}({}/{})",
        clock(t),
        player.name,
        online,
        capacity
    )
}

/// `[HH:MM]player-left:<name>(<online>/<capacity>)`
pub fn left_message(
    t: &DateTime<FixedOffset>,
    player: &Player,
    online: usize,
    capacity: usize,
) -> String {
    format!(
        "[{}]player-left:{}({}/{})",
        clock(t),
        player.name,
        online,
        capacity
    )
}

/// `---<stamp>---(<online>/<capacity>)<Mem:<pct>%>`
///
/// The stamp carries the date on the hour. Unknown memory totals render as
/// `<Mem:unknown>`.
pub fn status_message(
    t: &DateTime<FixedOffset>,
    online: usize,
    capacity: usize,
    mem: &MemInfo,
) -> String {
    let stamp = if is_top_of_hour(t) {
        date_clock(t)
    } else {
        clock(t)
    };
    let mem = match mem.used_percent() {
        Some(pct) => format!("{:.1}%", pct),
        None => "unknown".to_string(),
    };
    format!("---{}---({}/{})<Mem:{}>", stamp, online, capacity, mem)
}

/// `Online:<name>,<name>,...`
pub fn online_message<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.into_iter().collect();
    format!("Online:{}", names.join(","))
}

/// First sanitizer stage, applied before romanization.
pub fn strip_nul_markers(text: &str) -> String {
    let mut text = text.replace('\0', "");
    // Removing one marker can join the halves of another.
    while text.contains(NUL_MARKER) {
        text = text.replace(NUL_MARKER, "");
    }
    text
}

/// Last sanitizer stage, applied after romanization.
///
/// Spaces become underscores, surrounding whitespace is trimmed, and every
/// character that does not encode as exactly one byte becomes [`PLACEHOLDER`].
pub fn make_broadcast_safe(text: &str) -> String {
    text.replace(' ', "_")
        .trim()
        .chars()
        .map(|c| if c.len_utf8() == 1 { c } else { PLACEHOLDER })
        .collect()
}
