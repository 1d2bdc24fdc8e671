//! Time utilities: effective-date parsing for ledger ordering.
//!
//! Dates are client-local and treated as UTC; no timezone conversion happens here.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Parse the date shapes the finance service emits ("2025-04-02T10:15:00Z",
/// "2025-04-02 10:15:00", "02-04-2025", ...). Unparseable input yields None.
pub fn parse_effective_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ndt.and_utc());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
        }
    }

    tracing::debug!(raw, "unparseable effective date");
    None
}

/// Epoch milliseconds, as sent by some mobile payloads.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
}

/// Start of `date` (inclusive lower bound for report windows).
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Last instant of `date` (inclusive upper bound for report windows).
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let next = date.succ_opt().map(start_of_day);
    match next {
        Some(next) => next - chrono::Duration::nanoseconds(1),
        None => DateTime::<Utc>::MAX_UTC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_effective_date("2025-04-02T10:15:00+05:30").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 4, 2, 4, 45, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_shapes() {
        let expected = Utc.with_ymd_and_hms(2025, 4, 2, 10, 15, 0).unwrap();
        assert_eq!(parse_effective_date("2025-04-02T10:15:00"), Some(expected));
        assert_eq!(parse_effective_date("2025-04-02 10:15:00"), Some(expected));
        assert_eq!(parse_effective_date("2025-04-02 10:15"), Some(expected));

        let midnight = Utc.with_ymd_and_hms(2025, 4, 2, 0, 0, 0).unwrap();
        assert_eq!(parse_effective_date("2025-04-02"), Some(midnight));
        assert_eq!(parse_effective_date("02-04-2025"), Some(midnight));
        assert_eq!(parse_effective_date("02/04/2025"), Some(midnight));
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert_eq!(parse_effective_date(""), None);
        assert_eq!(parse_effective_date("yesterday"), None);
        assert_eq!(parse_effective_date("2025-13-40"), None);
    }

    #[test]
    fn test_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
        assert_eq!(start_of_day(day), Utc.with_ymd_and_hms(2025, 4, 2, 0, 0, 0).unwrap());
        let end = end_of_day(day);
        assert!(end < Utc.with_ymd_and_hms(2025, 4, 3, 0, 0, 0).unwrap());
        assert!(end > Utc.with_ymd_and_hms(2025, 4, 2, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_epoch_millis() {
        assert_eq!(
            from_epoch_millis(1_743_552_000_000),
            Some(Utc.with_ymd_and_hms(2025, 4, 2, 0, 0, 0).unwrap())
        );
    }
}
