//! Keyset pagination cursor.
//!
//! A cursor marks the last post on a page: its creation time in microseconds
//! since the Unix epoch, then `:` and the post id. Posts created in the same
//! microsecond are ordered by id. A bare timestamp is accepted too and skips
//! everything created at that instant. Clients treat it as an opaque string.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::FieldError;

/// 4714-11-24 00:00:00 UTC BC, the earliest instant a Postgres `timestamptz`
/// can hold. Later bounds are already past what chrono represents.
const EARLIEST_STORABLE_MICROS: i64 = -210_866_803_200_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    created_at: DateTime<Utc>,
    id: Option<i32>,
}

impl Cursor {
    /// Position of the post created at `created_at` with this `id`.
    pub fn new(created_at: DateTime<Utc>, id: i32) -> Self {
        Self {
            created_at,
            id: Some(id),
        }
    }

    /// Position before every post created at `created_at`.
    pub fn at(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            id: None,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    /// Whether the post at (`created_at`, `id`) is listed after this position
    /// in newest-first order.
    pub fn comes_after(&self, created_at: DateTime<Utc>, id: i32) -> bool {
        created_at < self.created_at
            || (created_at == self.created_at && self.id.is_some_and(|last| id < last))
    }

    /// Parse an optional client-supplied cursor. An empty string is the same
    /// as no cursor; anything else that does not parse is rejected.
    pub fn parse_opt(raw: Option<&str>) -> Result<Option<Self>, FieldError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(token) => token.parse().map(Some),
        }
    }
}

fn parse_instant(micros: &str) -> Option<DateTime<Utc>> {
    micros
        .parse::<i64>()
        .ok()
        .filter(|micros| *micros >= EARLIEST_STORABLE_MICROS)
        .and_then(DateTime::<Utc>::from_timestamp_micros)
}

impl FromStr for Cursor {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cursor = match s.split_once(':') {
            Some((micros, id)) => parse_instant(micros)
                .zip(id.parse::<i32>().ok())
                .map(|(created_at, id)| Self::new(created_at, id)),
            None => parse_instant(s).map(Self::at),
        };
        cursor.ok_or_else(|| FieldError::new("cursor", "invalid cursor"))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.created_at.timestamp_micros())?;
        if let Some(id) = self.id {
            write!(f, ":{id}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cursor_keeps_microseconds_and_id() {
        let at = Utc.timestamp_micros(1_600_872_884_621_123).unwrap();
        let cursor = Cursor::new(at, 42);

        assert_eq!(cursor.to_string(), "1600872884621123:42");
        let parsed: Cursor = cursor.to_string().parse().unwrap();
        assert_eq!(parsed.created_at(), at);
        assert_eq!(parsed.id(), Some(42));
    }

    #[test]
    fn test_bare_timestamp_cursor() {
        let cursor: Cursor = "1600872884621123".parse().unwrap();

        assert_eq!(cursor.id(), None);
        assert_eq!(cursor.to_string(), "1600872884621123");
    }

    #[test]
    fn test_missing_and_empty_cursor() {
        assert_eq!(Cursor::parse_opt(None).unwrap(), None);
        assert_eq!(Cursor::parse_opt(Some("")).unwrap(), None);
        assert_eq!(Cursor::parse_opt(Some("  ")).unwrap(), None);
    }

    #[test]
    fn test_malformed_cursor_is_rejected() {
        let too_big = i64::MAX.to_string();
        let too_early = (EARLIEST_STORABLE_MICROS - 1).to_string();
        for raw in [
            "yesterday",
            "12.5",
            "0x10",
            too_big.as_str(),
            too_early.as_str(),
            "-8000000000000000000",
            "1600872884621123:",
            "1600872884621123:abc",
            ":7",
        ] {
            let err = Cursor::parse_opt(Some(raw)).unwrap_err();
            assert_eq!(err.field, "cursor", "cursor {raw:?} should be rejected");
        }
    }

    #[test]
    fn test_earliest_storable_instant_is_accepted() {
        let raw = EARLIEST_STORABLE_MICROS.to_string();
        assert!(Cursor::parse_opt(Some(&raw)).unwrap().is_some());
    }

    #[test]
    fn test_same_instant_is_ordered_by_id() {
        let at = Utc.timestamp_micros(1_000_000).unwrap();
        let earlier = Utc.timestamp_micros(999_999).unwrap();
        let cursor = Cursor::new(at, 10);

        assert!(cursor.comes_after(at, 9));
        assert!(!cursor.comes_after(at, 10));
        assert!(!cursor.comes_after(at, 11));
        assert!(cursor.comes_after(earlier, 99));

        let bare = Cursor::at(at);
        assert!(!bare.comes_after(at, 1));
        assert!(bare.comes_after(earlier, 1));
    }
}
