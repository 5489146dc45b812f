//! Timestamps with provenance.
//!
//! Bulletins carry day/hour/minute groups without month or year, and
//! extraction times arrive as loosely formatted strings. Decoding never
//! stops on a bad timestamp: it substitutes the processing clock and marks
//! the value as a fallback.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Serialize, Serializer};

/// Whether a timestamp came from the bulletin or from the fallback clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Exact,
    Fallback,
}

/// A UTC instant tagged with its provenance. Serializes as ISO-8601.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecodedTime {
    pub time: DateTime<Utc>,
    pub provenance: Provenance,
}

impl DecodedTime {
    pub fn exact(time: DateTime<Utc>) -> Self {
        Self {
            time,
            provenance: Provenance::Exact,
        }
    }

    pub fn fallback(now: DateTime<Utc>) -> Self {
        Self {
            time: now,
            provenance: Provenance::Fallback,
        }
    }

    /// Exact when `time` is present, otherwise the fallback clock
    pub fn or_fallback(time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match time {
            Some(t) => Self::exact(t),
            None => Self::fallback(now),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.provenance == Provenance::Fallback
    }

    pub fn timestamp(&self) -> i64 {
        self.time.timestamp()
    }

    pub fn to_iso(&self) -> String {
        self.time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl Serialize for DecodedTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso())
    }
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 string or epoch-seconds number.
///
/// Accepts RFC 3339 (`Z` or numeric offset), naive date-times read as UTC,
/// bare dates, and integer or fractional epoch seconds.
pub fn parse_iso8601(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
    }
    from_epoch(text)
}

fn from_epoch(text: &str) -> Option<DateTime<Utc>> {
    let secs: f64 = text.parse().ok()?;
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    Utc.timestamp_opt(whole as i64, nanos.min(999_999_999)).single()
}

/// Parse an optional timestamp, falling back to `now` on absence or failure.
pub fn parse_timestamp(text: Option<&str>, now: DateTime<Utc>) -> DecodedTime {
    DecodedTime::or_fallback(text.and_then(parse_iso8601), now)
}

/// Build a timestamp in the same month and year as `reference`.
///
/// Returns `None` when the day does not exist in that month. Hour `24` with
/// minute `0` is read as midnight ending the given day.
pub fn day_time(reference: DateTime<Utc>, day: u32, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    compose(reference.year(), reference.month(), day, hour, minute)
}

/// Build a timestamp on or after `anchor`'s month.
///
/// A day-of-month earlier than the anchor's day is taken to fall in the
/// following month, wrapping December into January of the next year.
pub fn day_time_after(anchor: DateTime<Utc>, day: u32, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let (mut year, mut month) = (anchor.year(), anchor.month());
    if day < anchor.day() {
        if month == 12 {
            month = 1;
            year += 1;
        } else {
            month += 1;
        }
    }
    compose(year, month, day, hour, minute)
}

fn compose(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let naive = if hour == 24 && minute == 0 {
        date.succ_opt()?.and_hms_opt(0, 0, 0)?
    } else {
        date.and_hms_opt(hour, minute, 0)?
    };
    Some(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn parses_zulu_and_offset_strings() {
        assert_eq!(
            parse_iso8601("2025-10-12T16:46:42Z"),
            Some(Utc.with_ymd_and_hms(2025, 10, 12, 16, 46, 42).unwrap())
        );
        assert_eq!(
            parse_iso8601("2025-10-12T18:46:42+02:00"),
            Some(Utc.with_ymd_and_hms(2025, 10, 12, 16, 46, 42).unwrap())
        );
        assert_eq!(
            parse_iso8601("2025-10-12 16:46:42"),
            Some(Utc.with_ymd_and_hms(2025, 10, 12, 16, 46, 42).unwrap())
        );
        assert_eq!(parse_iso8601("2025-10-12"), Some(at(2025, 10, 12, 0, 0)));
    }

    #[test]
    fn parses_epoch_seconds() {
        assert_eq!(parse_iso8601("0"), Some(at(1970, 1, 1, 0, 0)));
        assert_eq!(
            parse_iso8601("1760287602"),
            Some(Utc.with_ymd_and_hms(2025, 10, 12, 16, 46, 42).unwrap())
        );
    }

    #[test]
    fn bad_input_falls_back_to_now() {
        let now = at(2024, 5, 1, 12, 0);
        for raw in [Some("yesterday"), Some(""), Some("2024-13-45T00:00:00Z"), None] {
            let t = parse_timestamp(raw, now);
            assert!(t.is_fallback(), "{raw:?}");
            assert_eq!(t.time, now);
        }
        let exact = parse_timestamp(Some("2024-05-01T00:00:00Z"), now);
        assert!(!exact.is_fallback());
    }

    #[test]
    fn serializes_as_iso_string() {
        let t = DecodedTime::exact(at(2024, 5, 26, 23, 53));
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"2024-05-26T23:53:00Z\"");
    }

    #[test]
    fn day_time_stays_in_reference_month() {
        let now = at(2024, 4, 2, 0, 0);
        assert_eq!(day_time(now, 26, 23, 53), Some(at(2024, 4, 26, 23, 53)));
        // April has 30 days
        assert_eq!(day_time(now, 31, 0, 0), None);
        assert_eq!(day_time(now, 5, 25, 0), None);
    }

    #[test]
    fn hour_twenty_four_is_next_midnight() {
        let now = at(2024, 4, 2, 0, 0);
        assert_eq!(day_time(now, 30, 24, 0), Some(at(2024, 5, 1, 0, 0)));
    }

    #[test]
    fn day_time_after_rolls_month_and_year() {
        let anchor = at(2024, 12, 31, 18, 0);
        assert_eq!(day_time_after(anchor, 1, 6, 0), Some(at(2025, 1, 1, 6, 0)));
        let anchor = at(2024, 1, 30, 0, 0);
        assert_eq!(day_time_after(anchor, 2, 0, 0), Some(at(2024, 2, 2, 0, 0)));
        assert_eq!(day_time_after(anchor, 31, 12, 0), Some(at(2024, 1, 31, 12, 0)));
    }
}
