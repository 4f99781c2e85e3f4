use std::env::var;
use std::time::Duration;

use chrono_tz::Tz;
use dotenvy::dotenv;

use crate::error::ConfigError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// RCON endpoint as host:port
    /// Env: RCON_ENDPOINT (required)
    pub rcon_endpoint: String,

    /// RCON admin password
    /// Env: RCON_PASSWORD (default: empty)
    pub rcon_password: String,

    /// Delay between two polls of the player list
    /// Env: INTERVAL (default: "5s")
    pub interval: Duration,

    /// Dial timeout and execute deadline for every RCON command
    /// Env: TIMEOUT (default: "1s")
    pub timeout: Duration,

    /// Romanize broadcasts through mecab and uconv
    /// Env: UCONV_LATIN (default: enabled, disabled only by "false")
    pub romanize: bool,

    /// Time zone for message timestamps and the status schedule
    /// Env: TIMEZONE (default: "Asia/Tokyo")
    pub timezone: Tz,

    /// Server capacity shown next to the player count
    /// Env: MAX_PLAYERS (default: 32)
    pub max_players: usize,
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv();
        Self::from_lookup(|key| var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let rcon_endpoint = lookup("RCON_ENDPOINT")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("RCON_ENDPOINT"))?;

        let interval = match non_empty(lookup("INTERVAL")) {
            Some(raw) => parse_duration(&raw).ok_or(ConfigError::InvalidDuration {
                var: "INTERVAL",
                value: raw,
            })?,
            None => defaults.interval,
        };

        let timeout = match non_empty(lookup("TIMEOUT")) {
            Some(raw) => parse_duration(&raw).ok_or(ConfigError::InvalidDuration {
                var: "TIMEOUT",
                value: raw,
            })?,
            None => defaults.timeout,
        };

        let timezone = match non_empty(lookup("TIMEZONE")) {
            Some(raw) => raw.trim().parse::<Tz>().map_err(|_| ConfigError::InvalidTimezone {
                var: "TIMEZONE",
                value: raw,
            })?,
            None => defaults.timezone,
        };

        let max_players = match non_empty(lookup("MAX_PLAYERS")) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber {
                var: "MAX_PLAYERS",
                value: raw,
            })?,
            None => defaults.max_players,
        };

        Ok(Self {
            rcon_endpoint,
            rcon_password: lookup("RCON_PASSWORD").unwrap_or_default(),
            interval,
            timeout,
            romanize: lookup("UCONV_LATIN").as_deref() != Some("false"),
            timezone,
            max_players,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rcon_endpoint: String::new(),
            rcon_password: String::new(),
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(1),
            romanize: true,
            timezone: Tz::Asia__Tokyo,
            max_players: 32,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse a unit-suffixed duration such as `300ms`, `5s`, `1m30s` or `1.5h`.
///
/// A bare `0` is accepted. Negative durations are not.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let s = input.trim();
    if s == "0" {
        return Some(Duration::ZERO);
    }
    if s.is_empty() {
        return None;
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let value: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        rest = &rest[unit_len..];

        total += value * nanos_per_unit;
    }

    if !total.is_finite() || total > u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(total.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert!(config.romanize);
        assert_eq!(config.timezone, Tz::Asia__Tokyo);
        assert_eq!(config.max_players, 32);
    }

    #[test]
    fn test_from_lookup_uses_defaults() {
        let config = Config::from_lookup(lookup(&[("RCON_ENDPOINT", "127.0.0.1:25575")])).unwrap();
        assert_eq!(config.rcon_endpoint, "127.0.0.1:25575");
        assert_eq!(config.rcon_password, "");
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert!(config.romanize);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("RCON_ENDPOINT", "palworld:25575"),
            ("RCON_PASSWORD", "hunter2"),
            ("INTERVAL", "10s"),
            ("TIMEOUT", "1500ms"),
            ("UCONV_LATIN", "false"),
            ("TIMEZONE", "America/New_York"),
            ("MAX_PLAYERS", "16"),
        ]))
        .unwrap();
        assert_eq!(config.rcon_password, "hunter2");
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert!(!config.romanize);
        assert_eq!(config.timezone, Tz::America__New_York);
        assert_eq!(config.max_players, 16);
    }

    #[test]
    fn test_romanize_only_disabled_by_false() {
        let config = Config::from_lookup(lookup(&[("RCON_ENDPOINT", "x:1"), ("UCONV_LATIN", "0")])).unwrap();
        assert!(config.romanize);
    }

    #[test]
    fn test_missing_endpoint_is_fatal() {
        assert_eq!(
            Config::from_lookup(lookup(&[])).unwrap_err(),
            ConfigError::Missing("RCON_ENDPOINT")
        );
    }

    #[test]
    fn test_invalid_values_are_fatal() {
        assert_eq!(
            Config::from_lookup(lookup(&[("RCON_ENDPOINT", "x:1"), ("INTERVAL", "5 seconds")])).unwrap_err(),
            ConfigError::InvalidDuration {
                var: "INTERVAL",
                value: "5 seconds".to_string()
            }
        );
        assert!(matches!(
            Config::from_lookup(lookup(&[("RCON_ENDPOINT", "x:1"), ("TIMEOUT", "1")])),
            Err(ConfigError::InvalidDuration { var: "TIMEOUT", .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("RCON_ENDPOINT", "x:1"), ("TIMEZONE", "Mars/Olympus_Mons")])),
            Err(ConfigError::InvalidTimezone { var: "TIMEZONE", .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("RCON_ENDPOINT", "x:1"), ("MAX_PLAYERS", "lots")])),
            Err(ConfigError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("0"), Some(Duration::ZERO));
        assert_eq!(parse_duration("5s"), Some(Duration::from_secs(5)));
        assert_eq!(parse_duration("300ms"), Some(Duration::from_millis(300)));
        assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("1.5h"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("250us"), Some(Duration::from_micros(250)));
        assert_eq!(parse_duration("10ns"), Some(Duration::from_nanos(10)));
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("5"), None);
        assert_eq!(parse_duration("s"), None);
        assert_eq!(parse_duration("-1s"), None);
        assert_eq!(parse_duration("5d"), None);
    }
}
