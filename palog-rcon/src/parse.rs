//! Parsing of the `ShowPlayers` response.
//!
//! The response is CSV-like text: a `name,playeruid,steamid` header followed by
//! one line per player. The server occasionally garbles bytes, so the body is
//! decoded leniently and every field is filtered down to printable characters
//! instead of rejecting the line.

use unicode_general_category::{GeneralCategory, get_general_category};

use crate::models::Player;

/// Parse the raw `ShowPlayers` output into players, in input order.
///
/// The first line is always treated as the header. Blank lines are skipped and
/// missing fields are left empty. Duplicates are kept.
pub fn parse_players(raw: &[u8]) -> Vec<Player> {
    // Invalid sequences become U+FFFD, which `printable` drops.
    let text = String::from_utf8_lossy(raw);
    let mut lines = text.split('\n');
    // header
    lines.next();

    let mut players = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split(',');
        let name = fields.next().map(printable).unwrap_or_default();
        let player_uid = fields.next().map(printable).unwrap_or_default();
        let steam_id = fields.next().map(printable).unwrap_or_default();

        players.push(Player {
            name,
            player_uid,
            steam_id,
        });
    }

    players
}

/// Keep only printable characters.
///
/// Printable means a letter, mark, number, punctuation or symbol, plus the
/// ASCII space. The replacement character left behind by invalid UTF-8 is
/// dropped as well.
pub fn printable(field: &str) -> String {
    field.chars().filter(|&c| is_printable(c)).collect()
}

fn is_printable(c: char) -> bool {
    use GeneralCategory::*;

    if c == ' ' {
        return true;
    }
    if c == char::REPLACEMENT_CHARACTER {
        return false;
    }
    matches!(
        get_general_category(c),
        UppercaseLetter
            | LowercaseLetter
            | TitlecaseLetter
            | ModifierLetter
            | OtherLetter
            | NonspacingMark
            | SpacingMark
            | EnclosingMark
            | DecimalNumber
            | LetterNumber
            | OtherNumber
            | ConnectorPunctuation
            | DashPunctuation
            | OpenPunctuation
            | ClosePunctuation
            | InitialPunctuation
            | FinalPunctuation
            | OtherPunctuation
            | MathSymbol
            | CurrencySymbol
            | ModifierSymbol
            | OtherSymbol
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_rows() {
        let raw = "name,playeruid,steamid\nAlice,123456789,76561198000000001\nBob,987654321,76561198000000002\n";
        let players = parse_players(raw.as_bytes());
        assert_eq!(
            players,
            vec![
                Player::new("Alice", "123456789", "76561198000000001"),
                Player::new("Bob", "987654321", "76561198000000002"),
            ]
        );
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(parse_players(b"name,playeruid,steamid\n").is_empty());
        assert!(parse_players(b"").is_empty());
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let players = parse_players(b"header\nAlice\nBob,123456789\n");
        assert_eq!(players[0], Player::new("Alice", "", ""));
        assert_eq!(players[1], Player::new("Bob", "123456789", ""));
    }

    #[test]
    fn test_blank_lines_skipped_and_duplicates_kept() {
        let players = parse_players(b"header\n\nAlice,1,2\n\nAlice,1,2\n");
        assert_eq!(players.len(), 2);
        assert_eq!(players[0], players[1]);
    }

    #[test]
    fn test_extra_fields_ignored() {
        let players = parse_players(b"header\nAlice,1,2,3,4");
        assert_eq!(players, vec![Player::new("Alice", "1", "2")]);
    }

    #[test]
    fn test_fields_are_filtered() {
        let raw = "header\r\nAl\u{0}ice\u{200B},1234\u{7}56789,7656\u{FFFD}1198\r\n";
        let players = parse_players(raw.as_bytes());
        assert_eq!(players, vec![Player::new("Alice", "123456789", "76561198")]);
    }

    #[test]
    fn test_invalid_utf8_only_loses_bad_bytes() {
        // "パル" with its last character cut to two of three bytes.
        let raw = b"header\n\xE3\x83\x91\xE3\x83,123456789,1\nBob,2\xC0,3\n";
        let players = parse_players(raw);
        assert_eq!(
            players,
            vec![Player::new("パ", "123456789", "1"), Player::new("Bob", "2", "3")]
        );
    }

    #[test]
    fn test_non_printable_categories_dropped() {
        // private use, tag character, unassigned, line separator
        assert_eq!(printable("Al\u{E000}i\u{E0041}ce\u{0378}\u{2028}"), "Alice");
        // marks, symbols and punctuation stay
        assert_eq!(printable("e\u{301}★-!"), "e\u{301}★-!");
    }

    #[test]
    fn test_printable_keeps_non_latin_names() {
        assert_eq!(printable("パル 太郎"), "パル 太郎");
        assert_eq!(printable("a\u{3000}b\tc"), "abc");
    }
}
