use chrono::{DateTime, FixedOffset, Timelike, Utc};
use chrono_tz::Tz;

/// Current wall-clock time in `tz`, pinned to the offset in effect right now.
pub fn now_in(tz: Tz) -> DateTime<FixedOffset> {
  Utc::now().with_timezone(&tz).fixed_offset()
}

/// `HH:MM`
pub fn clock(t: &DateTime<FixedOffset>) -> String {
  t.format("%H:%M").to_string()
}

/// `MM/DD_HH:MM`
pub fn date_clock(t: &DateTime<FixedOffset>) -> String {
  t.format("%m/%d_%H:%M").to_string()
}

/// Status reports go out on the hour and on the half hour.
pub fn in_status_window(t: &DateTime<FixedOffset>) -> bool {
  matches!(t.minute(), 0 | 30)
}

pub fn is_top_of_hour(t: &DateTime<FixedOffset>) -> bool {
  t.minute() == 0
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(9 * 3600)
      .unwrap()
      .with_ymd_and_hms(2024, 1, 23, hour, minute, 15)
      .unwrap()
  }

  #[test]
  fn test_formats() {
    assert_eq!(clock(&at(7, 5)), "07:05");
    assert_eq!(date_clock(&at(0, 0)), "01/23_00:00");
  }

  #[test]
  fn test_status_window() {
    assert!(in_status_window(&at(13, 0)));
    assert!(in_status_window(&at(13, 30)));
    assert!(!in_status_window(&at(13, 1)));
    assert!(!in_status_window(&at(13, 59)));
    assert!(is_top_of_hour(&at(13, 0)));
    assert!(!is_top_of_hour(&at(13, 30)));
  }

  #[test]
  fn test_now_in_uses_zone_offset() {
    assert_eq!(now_in(chrono_tz::Asia::Tokyo).offset().local_minus_utc(), 9 * 3600);
    assert_eq!(now_in(chrono_tz::UTC).offset().local_minus_utc(), 0);
  }
}
