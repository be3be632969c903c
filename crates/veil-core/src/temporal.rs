//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC-only timestamp truncated to seconds
//! precision. Proof artifacts and run history entries carry these.
//!
//! ## Security Invariant
//!
//! Timestamps that participate in canonicalized structures must be UTC
//! with Z suffix — a local offset would produce a different canonical byte
//! sequence for the same instant. Non-UTC inputs are rejected at parse,
//! never silently converted.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A UTC-only timestamp, truncated to seconds precision.
///
/// Renders as `YYYY-MM-DDTHH:MM:SSZ` — no sub-seconds, no `+00:00`,
/// always `Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse from an RFC 3339 string. Only the `Z` suffix is accepted;
    /// explicit offsets are rejected, even `+00:00`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTimestamp` if the string is not valid
    /// RFC 3339 or uses a non-Z offset.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if !s.ends_with('Z') {
            return Err(CoreError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| CoreError::InvalidTimestamp(format!("invalid RFC 3339 {s:?}: {e}")))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Render as `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    // with_nanosecond(0) only fails for leap-second nanos; fall back to dt.
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_has_no_subseconds() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_utc().nanosecond(), 0);
    }

    #[test]
    fn parse_accepts_z_suffix() {
        let ts = Timestamp::parse("2026-08-28T12:00:00Z").expect("parse");
        assert_eq!(ts.to_iso8601(), "2026-08-28T12:00:00Z");
    }

    #[test]
    fn parse_truncates_subseconds() {
        let ts = Timestamp::parse("2026-08-28T12:00:00.999Z").expect("parse");
        assert_eq!(ts.to_iso8601(), "2026-08-28T12:00:00Z");
    }

    #[test]
    fn parse_rejects_offsets() {
        assert!(Timestamp::parse("2026-08-28T12:00:00+00:00").is_err());
        assert!(Timestamp::parse("2026-08-28T12:00:00+05:30").is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Timestamp::parse("not a timestamp Z").is_err());
    }

    #[test]
    fn ordering_follows_time() {
        let a = Timestamp::parse("2026-08-28T12:00:00Z").unwrap();
        let b = Timestamp::parse("2026-08-28T12:00:01Z").unwrap();
        assert!(a < b);
    }

    #[test]
    fn display_matches_iso8601() {
        let ts = Timestamp::parse("2026-01-02T03:04:05Z").unwrap();
        assert_eq!(ts.to_string(), "2026-01-02T03:04:05Z");
    }
}
