//! Local wall-clock to UTC timestamp conversion.
//!
//! Timestamps travel as `YYYY-MM-DD HH:MM:SS` strings together with an IANA
//! zone id. [`to_utc`] interprets the string in that zone and reformats the
//! same instant in UTC using the identical pattern.

use chrono::{Duration, LocalResult, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;

use crate::error::{TimeError, TimeResult};

/// Pattern shared by local and UTC timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse an IANA zone id. Never falls back to a default zone.
pub fn parse_zone(zone_id: &str) -> TimeResult<Tz> {
    zone_id
        .parse::<Tz>()
        .map_err(|_| TimeError::UnknownTimezone(zone_id.to_string()))
}

/// Convert `local_timestamp`, read as wall-clock time in `zone_id`, to UTC.
///
/// Ambiguous wall-clock times (the repeated hour when clocks go back) resolve
/// to the earlier instant. Times inside a spring-forward gap are read with the
/// offset in force before the gap.
pub fn to_utc(local_timestamp: &str, zone_id: &str) -> TimeResult<String> {
    let tz = parse_zone(zone_id)?;
    let naive = NaiveDateTime::parse_from_str(local_timestamp.trim(), TIMESTAMP_FORMAT).map_err(|e| {
        TimeError::InvalidTimestamp {
            value: local_timestamp.to_string(),
            reason: e.to_string(),
        }
    })?;

    let utc = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.naive_utc(),
        LocalResult::Ambiguous(earliest, _) => earliest.naive_utc(),
        LocalResult::None => {
            let before = tz.offset_from_utc_datetime(&(naive - Duration::days(1))).fix();
            naive - Duration::seconds(i64::from(before.local_minus_utc()))
        }
    };

    Ok(utc.format(TIMESTAMP_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_los_angeles_winter() {
        assert_eq!(
            to_utc("2012-01-01 00:00:00", "America/Los_Angeles").unwrap(),
            "2012-01-01 08:00:00"
        );
    }

    #[test]
    fn test_los_angeles_summer_uses_dst() {
        assert_eq!(
            to_utc("2012-07-01 12:30:15", "America/Los_Angeles").unwrap(),
            "2012-07-01 19:30:15"
        );
    }

    #[test]
    fn test_day_rollover_east_of_utc() {
        assert_eq!(
            to_utc("2012-01-01 05:00:00", "Asia/Tokyo").unwrap(),
            "2011-12-31 20:00:00"
        );
    }

    #[test]
    fn test_utc_is_identity() {
        assert_eq!(to_utc("2012-03-04 05:06:07", "UTC").unwrap(), "2012-03-04 05:06:07");
    }

    #[test]
    fn test_ambiguous_hour_takes_earlier_instant() {
        // 01:30 happens twice on 2012-11-04 in Los Angeles; PDT comes first.
        assert_eq!(
            to_utc("2012-11-04 01:30:00", "America/Los_Angeles").unwrap(),
            "2012-11-04 08:30:00"
        );
    }

    #[test]
    fn test_gap_uses_offset_before_transition() {
        // 02:30 does not exist on 2012-03-11 in Los Angeles; read it as PST.
        assert_eq!(
            to_utc("2012-03-11 02:30:00", "America/Los_Angeles").unwrap(),
            "2012-03-11 10:30:00"
        );
    }

    #[test]
    fn test_unknown_timezone() {
        let err = to_utc("2012-01-01 00:00:00", "America/Atlantis").unwrap_err();
        assert!(matches!(err, TimeError::UnknownTimezone(ref z) if z == "America/Atlantis"));
    }

    #[test]
    fn test_invalid_timestamp() {
        let err = to_utc("01/01/2012 00:00", "UTC").unwrap_err();
        assert!(matches!(err, TimeError::InvalidTimestamp { .. }));
    }
}
