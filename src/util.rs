// src/util.rs
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Network epoch: 2021-01-01T00:00:00Z, in Unix seconds.
pub const NETWORK_EPOCH: u64 = 1_609_459_200;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>> {
    hex::decode(strip_0x(s)).map_err(|e| Error::validation(format!("bad hex '{s}': {e}")))
}

pub fn bytes_to_0x(v: &[u8]) -> String {
    format!("0x{}", hex::encode(v))
}

/// Current time in network-epoch seconds.
pub fn network_now() -> Result<u32> {
    let unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::MessageBuild(format!("system clock before Unix epoch: {e}")))?
        .as_secs();
    to_network_time(unix)
}

pub fn to_network_time(unix_secs: u64) -> Result<u32> {
    let secs = unix_secs
        .checked_sub(NETWORK_EPOCH)
        .ok_or_else(|| Error::MessageBuild("time is before the network epoch".into()))?;
    u32::try_from(secs).map_err(|_| Error::MessageBuild("timestamp overflows u32".into()))
}

pub fn network_to_unix(ts: u64) -> u64 {
    ts.saturating_add(NETWORK_EPOCH)
}

/// Short age label like `45s`, `3m`, `2h`, `5d`, `4mo`, `2y`.
pub fn relative_age(network_ts: u64, now_unix: u64) -> String {
    let seconds = now_unix.saturating_sub(network_to_unix(network_ts));
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h");
    }
    let days = hours / 24;
    if days < 30 {
        return format!("{days}d");
    }
    let months = days / 30;
    if months < 12 {
        return format!("{months}mo");
    }
    format!("{}y", months / 12)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_helpers() {
        assert_eq!(hex_to_bytes("0x0a0b").unwrap(), vec![10, 11]);
        assert_eq!(hex_to_bytes("0a0b").unwrap(), vec![10, 11]);
        assert!(hex_to_bytes("0xzz").is_err());
        assert_eq!(bytes_to_0x(&[0xde, 0xad]), "0xdead");
    }

    #[test]
    fn test_network_time() {
        assert_eq!(to_network_time(NETWORK_EPOCH + 42).unwrap(), 42);
        assert!(to_network_time(NETWORK_EPOCH - 1).is_err());
        assert_eq!(network_to_unix(42), NETWORK_EPOCH + 42);
    }

    #[test]
    fn test_relative_age() {
        let now = NETWORK_EPOCH + 100_000_000;
        let ts = |ago: u64| 100_000_000 - ago;
        assert_eq!(relative_age(ts(45), now), "45s");
        assert_eq!(relative_age(ts(3 * 60), now), "3m");
        assert_eq!(relative_age(ts(2 * 3600), now), "2h");
        assert_eq!(relative_age(ts(5 * 86_400), now), "5d");
        assert_eq!(relative_age(ts(120 * 86_400), now), "4mo");
        // future timestamps clamp to zero
        assert_eq!(relative_age(100_000_100, now), "0s");
    }

    #[test]
    fn test_huge_timestamp_does_not_overflow() {
        assert_eq!(network_to_unix(u64::MAX), u64::MAX);
        assert_eq!(relative_age(u64::MAX, 1_700_000_000), "0s");
    }

    #[test]
    fn test_relative_age_years() {
        let now = NETWORK_EPOCH + 100_000_000;
        assert_eq!(relative_age(100_000_000 - 800 * 86_400, now), "2y");
    }
}
