//! Zipcode -> IANA timezone lookup (C3's data source).
//!
//! A static, ordered table of US ZIP code ranges to timezone identifiers,
//! the same shape as the `timezone_mapper.json` table the source loads at
//! startup. Kept in-process rather than file-loaded since it never changes
//! at runtime.

use chrono::{NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

struct TimezoneEntry {
    state_code: &'static str,
    zipcode_start: u32,
    zipcode_end: u32,
    timezone_id: Tz,
}

const TIMEZONE_TABLE: &[TimezoneEntry] = &[
    TimezoneEntry { state_code: "ME", zipcode_start: 3900, zipcode_end: 4999, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "NH", zipcode_start: 3000, zipcode_end: 3899, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "MA", zipcode_start: 1000, zipcode_end: 2799, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "NY", zipcode_start: 6390, zipcode_end: 6390, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "NY", zipcode_start: 10000, zipcode_end: 14999, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "NJ", zipcode_start: 7000, zipcode_end: 8999, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "PA", zipcode_start: 15000, zipcode_end: 19699, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "DE", zipcode_start: 19700, zipcode_end: 19999, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "MD", zipcode_start: 20600, zipcode_end: 21999, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "DC", zipcode_start: 20000, zipcode_end: 20599, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "VA", zipcode_start: 22000, zipcode_end: 24699, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "NC", zipcode_start: 27000, zipcode_end: 28999, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "SC", zipcode_start: 29000, zipcode_end: 29999, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "GA", zipcode_start: 30000, zipcode_end: 31999, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "FL", zipcode_start: 32000, zipcode_end: 33999, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "MI", zipcode_start: 48000, zipcode_end: 49999, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "OH", zipcode_start: 43000, zipcode_end: 45999, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "WV", zipcode_start: 24700, zipcode_end: 26999, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "IN", zipcode_start: 46000, zipcode_end: 47999, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "KY", zipcode_start: 40000, zipcode_end: 42799, timezone_id: Tz::America__New_York },
    TimezoneEntry { state_code: "AL", zipcode_start: 35000, zipcode_end: 36999, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "MS", zipcode_start: 38600, zipcode_end: 39799, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "TN", zipcode_start: 37000, zipcode_end: 38599, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "IL", zipcode_start: 60000, zipcode_end: 62999, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "WI", zipcode_start: 53000, zipcode_end: 54999, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "MN", zipcode_start: 55000, zipcode_end: 56799, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "IA", zipcode_start: 50000, zipcode_end: 52899, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "MO", zipcode_start: 63000, zipcode_end: 65899, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "AR", zipcode_start: 71600, zipcode_end: 72999, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "LA", zipcode_start: 70000, zipcode_end: 71499, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "OK", zipcode_start: 73000, zipcode_end: 74999, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "TX", zipcode_start: 75000, zipcode_end: 79999, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "KS", zipcode_start: 66000, zipcode_end: 67999, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "NE", zipcode_start: 68000, zipcode_end: 69399, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "SD", zipcode_start: 57000, zipcode_end: 57799, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "ND", zipcode_start: 58000, zipcode_end: 58899, timezone_id: Tz::America__Chicago },
    TimezoneEntry { state_code: "CO", zipcode_start: 80000, zipcode_end: 81699, timezone_id: Tz::America__Denver },
    TimezoneEntry { state_code: "WY", zipcode_start: 82000, zipcode_end: 83199, timezone_id: Tz::America__Denver },
    TimezoneEntry { state_code: "MT", zipcode_start: 59000, zipcode_end: 59999, timezone_id: Tz::America__Denver },
    TimezoneEntry { state_code: "UT", zipcode_start: 84000, zipcode_end: 84799, timezone_id: Tz::America__Denver },
    TimezoneEntry { state_code: "NM", zipcode_start: 87000, zipcode_end: 88499, timezone_id: Tz::America__Denver },
    TimezoneEntry { state_code: "AZ", zipcode_start: 85000, zipcode_end: 86599, timezone_id: Tz::America__Phoenix },
    TimezoneEntry { state_code: "ID", zipcode_start: 83200, zipcode_end: 83899, timezone_id: Tz::America__Denver },
    TimezoneEntry { state_code: "NV", zipcode_start: 88900, zipcode_end: 89899, timezone_id: Tz::America__Los_Angeles },
    TimezoneEntry { state_code: "CA", zipcode_start: 90000, zipcode_end: 96199, timezone_id: Tz::America__Los_Angeles },
    TimezoneEntry { state_code: "OR", zipcode_start: 97000, zipcode_end: 97999, timezone_id: Tz::America__Los_Angeles },
    TimezoneEntry { state_code: "WA", zipcode_start: 98000, zipcode_end: 99499, timezone_id: Tz::America__Los_Angeles },
    TimezoneEntry { state_code: "AK", zipcode_start: 99500, zipcode_end: 99999, timezone_id: Tz::America__Anchorage },
    TimezoneEntry { state_code: "HI", zipcode_start: 96700, zipcode_end: 96899, timezone_id: Tz::Pacific__Honolulu },
];

fn lookup(zipcode: &str) -> Option<&'static TimezoneEntry> {
    let zipcode: u32 = zipcode.parse().ok()?;
    TIMEZONE_TABLE
        .iter()
        .find(|entry| entry.zipcode_start <= zipcode && zipcode <= entry.zipcode_end)
}

/// Extracts the trailing whitespace-delimited token of `address` and looks
/// up its timezone. Returns `None` if the token isn't a known ZIP code.
pub fn timezone_by_address(address: &str) -> Option<Tz> {
    let zipcode = address.split_whitespace().last()?;
    lookup(zipcode).map(|entry| entry.timezone_id)
}

pub fn state_code_by_zipcode(zipcode: &str) -> Option<&'static str> {
    lookup(zipcode).map(|entry| entry.state_code)
}

#[derive(Debug, thiserror::Error)]
pub enum TimeAddrError {
    #[error("could not determine timezone for address \"{0}\"")]
    UnknownTimezone(String),
    #[error("invalid date \"{date}\" or time \"{time}\": {reason}")]
    InvalidDateTime {
        date: String,
        time: String,
        reason: String,
    },
}

/// Resolves `date` ("Month Day, Year"), `time` ("HH:MM"), and `address`
/// (whose trailing token is a ZIP code) into a timezone-aware instant,
/// expressed in UTC.
pub fn resolve_pickup_instant(
    date: &str,
    time: &str,
    address: &str,
) -> Result<chrono::DateTime<chrono::Utc>, TimeAddrError> {
    let tz = timezone_by_address(address)
        .ok_or_else(|| TimeAddrError::UnknownTimezone(address.to_owned()))?;
    datetime_in(date, time, tz)
        .map(|local| local.with_timezone(&chrono::Utc))
        .map_err(|reason| TimeAddrError::InvalidDateTime {
            date: date.to_owned(),
            time: time.to_owned(),
            reason,
        })
}

/// Parses `date` ("Month Day, Year") and `time` ("HH:MM") as a local instant
/// in the given timezone.
pub fn datetime_in(date: &str, time: &str, tz: Tz) -> Result<chrono::DateTime<Tz>, String> {
    let (hour_str, minute_str) = time
        .split_once(':')
        .ok_or_else(|| format!("time \"{time}\" is not in HH:MM form"))?;
    let hour: u32 = hour_str.parse().map_err(|_| format!("bad hour in \"{time}\""))?;
    let minute: u32 = minute_str
        .parse()
        .map_err(|_| format!("bad minute in \"{time}\""))?;

    let naive_date =
        parse_loose_date(date).ok_or_else(|| format!("invalid date \"{date}\""))?;
    let naive = NaiveDateTime::new(
        naive_date,
        chrono::NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| format!("invalid time \"{time}\""))?,
    );

    match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => Ok(dt),
        chrono::LocalResult::Ambiguous(dt, _) => Ok(dt),
        chrono::LocalResult::None => Err(format!(
            "\"{date} {time}\" does not exist in timezone {tz}"
        )),
    }
}

/// Accepts "Month Day, Year" (e.g. "June 1, 2024") and a handful of common
/// variants. Not a general date parser — this system only ever sees
/// request-supplied dates in that one format.
fn parse_loose_date(date: &str) -> Option<NaiveDate> {
    const FORMATS: &[&str] = &["%B %-d, %Y", "%B %d, %Y", "%Y-%m-%d", "%m/%d/%Y"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
}

pub fn to_24hr(dt: chrono::DateTime<Tz>) -> String {
    dt.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_new_york_zip() {
        let instant = resolve_pickup_instant("January 1, 2024", "08:00", "123 Main St 10001")
            .expect("should resolve");
        let local = instant.with_timezone(&Tz::America__New_York);
        assert_eq!(to_24hr(local), "08:00");
    }

    #[test]
    fn unknown_zip_is_an_error() {
        let err = resolve_pickup_instant("January 1, 2024", "08:00", "nowhere 00000");
        assert!(err.is_err());
    }

    #[test]
    fn state_code_lookup() {
        assert_eq!(state_code_by_zipcode("90001"), Some("CA"));
    }
}
