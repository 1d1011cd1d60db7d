use crate::error::EpgError;
use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use regex_lite::Regex;

const CLOCK_PATTERN: &str = r"^(\d{1,2})(?::(\d{2}))?(?::(\d{2}))?\s*(AM|PM)$";

const WEEKDAY_NAMES: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Formats an instant the way XMLTV wants it: `YYYYMMDDHHMMSS ±HHMM`.
pub(crate) fn to_xmltv_time<T: TimeZone>(dt: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    dt.format("%Y%m%d%H%M%S %z").to_string()
}

/// Parses an ISO-8601 timestamp. Stamps without an offset are taken as UTC.
pub(crate) fn parse_iso(s: &str) -> Result<DateTime<Utc>, EpgError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(EpgError::MalformedTimestamp(s.to_string()))
}

/// Attaches `tz` to a wall-clock time.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant; times
/// inside a DST gap are pushed forward by an hour.
pub(crate) fn localize(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>, EpgError> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .ok_or_else(|| EpgError::NonexistentLocalTime(naive.to_string())),
    }
}

/// Parses a 12-hour clock string such as `3:50PM`, `12 AM` or `1:00:30 pm`.
pub(crate) fn parse_clock(s: &str) -> Result<NaiveTime, EpgError> {
    let upper = s.trim().to_uppercase();
    let malformed = || EpgError::MalformedTimestamp(s.trim().to_string());
    let re = Regex::new(CLOCK_PATTERN)?;
    let caps = re.captures(&upper).ok_or_else(malformed)?;

    let hour: u32 = caps[1].parse().map_err(|_| malformed())?;
    let minute: u32 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse()).map_err(|_| malformed())?;
    let second: u32 = caps.get(3).map_or(Ok(0), |m| m.as_str().parse()).map_err(|_| malformed())?;
    if !(1..=12).contains(&hour) {
        return Err(malformed());
    }
    let hour = match (&caps[4], hour) {
        ("AM", 12) => 0,
        ("AM", h) => h,
        ("PM", 12) => 12,
        (_, h) => h + 12,
    };
    NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(malformed)
}

/// Parses a time-of-day key: 24-hour `HH:MM` / `HH:MM:SS`, or anything
/// [`parse_clock`] accepts.
pub(crate) fn parse_time_of_day(s: &str) -> Result<NaiveTime, EpgError> {
    let trimmed = s.trim();
    for format in ["%H:%M", "%H:%M:%S"] {
        if let Ok(t) = NaiveTime::parse_from_str(trimmed, format) {
            return Ok(t);
        }
    }
    parse_clock(trimmed)
}

/// Full or three-letter weekday name, any case.
pub(crate) fn parse_weekday(s: &str) -> Option<Weekday> {
    s.trim().parse::<Weekday>().ok()
}

/// Full weekday name only, any case. `Mon` or `Wed` is not a match.
pub(crate) fn parse_full_weekday(s: &str) -> Option<Weekday> {
    let day = parse_weekday(s)?;
    s.trim()
        .eq_ignore_ascii_case(WEEKDAY_NAMES[day.num_days_from_monday() as usize])
        .then_some(day)
}

/// A positive run length of `minutes`, or `DurationOutOfRange` when chrono
/// can't represent it.
pub(crate) fn positive_minutes(minutes: i64) -> Result<Duration, EpgError> {
    Duration::try_minutes(minutes)
        .filter(|d| *d > Duration::zero())
        .ok_or(EpgError::DurationOutOfRange(minutes))
}

/// Today's calendar date as seen in `tz`.
pub(crate) fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// `days` consecutive dates starting at `first`.
pub(crate) fn date_window(first: NaiveDate, days: u32) -> impl Iterator<Item = NaiveDate> {
    first.iter_days().take(days as usize)
}
