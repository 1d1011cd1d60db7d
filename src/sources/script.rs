//! Weekly schedule embedded in a web page as a JavaScript object literal:
//!
//! ```js
//! var schedule = { Monday: { "08:00": "Cartoons", "09:30": "News", }, ... };
//! ```

use super::relaxed::{closing_bracket, parse_relaxed_schedule, strip_comments, DaySchedule, WeeklySchedule};
use crate::{
    error::EpgError,
    fetch::Fetcher,
    programme::{finalize, Programme},
    time::{date_window, localize, parse_time_of_day, parse_weekday, positive_minutes, today_in},
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use log::{debug, info, warn};
use regex_lite::Regex;
use serde::Deserialize;

/// How long the last show of a day runs, since nothing follows it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum LastEntryPolicy {
    FixedMinutes(i64),
    /// Until 23:59 of the same day.
    EndOfDay,
}

impl Default for LastEntryPolicy {
    fn default() -> Self {
        LastEntryPolicy::FixedMinutes(30)
    }
}

impl LastEntryPolicy {
    fn stop_for(self, start: NaiveDateTime) -> Result<NaiveDateTime, EpgError> {
        match self {
            LastEntryPolicy::FixedMinutes(minutes) => start
                .checked_add_signed(positive_minutes(minutes)?)
                .ok_or(EpgError::DurationOutOfRange(minutes)),
            LastEntryPolicy::EndOfDay => Ok(start.date().and_hms_opt(23, 59, 0).unwrap_or(start)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ScriptSource {
    pub(crate) url: String,
    /// Identifier the schedule object is assigned to, e.g. `schedule`.
    pub(crate) variable: String,
    pub(crate) source_tz: Tz,
    pub(crate) output_tz: Tz,
    #[serde(default = "default_days")]
    pub(crate) days: u32,
    #[serde(default)]
    pub(crate) last_entry: LastEntryPolicy,
}

fn default_days() -> u32 {
    7
}

/// Pulls the object literal assigned to `variable` out of `page` and parses it.
pub(crate) fn extract_schedule(page: &str, variable: &str) -> Result<WeeklySchedule, EpgError> {
    let pattern = format!(r"(?:^|[^\w$.]){}\s*=\s*\{{", regex_lite::escape(variable));
    let re = Regex::new(&pattern)?;
    let found = re
        .find(page)
        .ok_or_else(|| EpgError::ScheduleNotFound(format!("no object assigned to '{variable}'")))?;

    let literal = strip_comments(&page[found.end() - 1..]);
    let end = closing_bracket(&literal).ok_or_else(|| {
        EpgError::ScheduleNotFound(format!("object assigned to '{variable}' is never closed"))
    })?;
    debug!("Extracted {} byte schedule literal", end + 1);
    parse_relaxed_schedule(&literal[..=end])
}

fn day_for(schedule: &WeeklySchedule, weekday: Weekday) -> Option<&DaySchedule> {
    schedule
        .iter()
        .find(|(name, _)| parse_weekday(name) == Some(weekday))
        .map(|(_, day)| day)
}

/// One day's shows in `source_tz`; each ends when the next one starts.
pub(crate) fn programmes_for_date(
    day: &DaySchedule,
    date: NaiveDate,
    source_tz: Tz,
    last_entry: LastEntryPolicy,
) -> Result<Vec<Programme>, EpgError> {
    let mut entries: Vec<(NaiveTime, &str)> = vec![];
    for (key, title) in day {
        match parse_time_of_day(key) {
            Ok(time) => entries.push((time, title.trim())),
            Err(e) => warn!("Skipping entry on {date}: {e}"),
        }
    }
    entries.sort_by_key(|(time, _)| *time);

    let mut programmes = vec![];
    for (i, &(time, title)) in entries.iter().enumerate() {
        let start = date.and_time(time);
        let stop = match entries.get(i + 1) {
            Some(&(next, _)) => {
                let next = date.and_time(next);
                if next > start {
                    next
                } else {
                    next + Duration::days(1)
                }
            }
            None => last_entry.stop_for(start)?,
        };
        if title.is_empty() {
            continue;
        }
        match (localize(source_tz, start), localize(source_tz, stop)) {
            (Ok(start), Ok(stop)) => programmes.push(Programme::new(title, start, stop)),
            (Err(e), _) | (_, Err(e)) => warn!("Skipping '{title}': {e}"),
        }
    }
    Ok(programmes)
}

pub(crate) fn normalize(
    page: &str,
    source: &ScriptSource,
    today: NaiveDate,
) -> Result<Vec<Programme>, EpgError> {
    let schedule = extract_schedule(page, &source.variable)?;
    debug!("Schedule lists {} day(s)", schedule.len());

    let tz = source.output_tz;
    let mut programmes = vec![];
    for date in date_window(today, source.days) {
        let Some(day) = day_for(&schedule, date.weekday()) else {
            warn!("No shows listed for {} ({date})", date.format("%A"));
            continue;
        };
        for mut p in programmes_for_date(day, date, source.source_tz, source.last_entry)? {
            p.start = p.start.with_timezone(&tz);
            p.stop = p.stop.with_timezone(&tz);
            programmes.push(p);
        }
    }
    Ok(finalize(programmes))
}

pub(crate) async fn fetch_programmes<F: Fetcher>(
    fetcher: &F,
    source: &ScriptSource,
    now: DateTime<Utc>,
) -> Result<Vec<Programme>, EpgError> {
    info!("Fetching schedule page...");
    let page = fetcher.text(&source.url).await?;
    normalize(&page, source, today_in(source.output_tz, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::to_xmltv_time;
    use chrono_tz::America::{Chicago, New_York};

    const PAGE: &str = r#"<html><head><script>
  // generated nightly
  var settings = { theme: 'dark' };
  window.schedule = {
    Monday: {
      "22:00": "Late Movie",
      "08:00": "Morning Cartoons", // opener
      "9:30": "Brunch Show",
      "23:45": "",
    },
    'Tuesday': { '07:00': 'Early Bird', },
  };
</script></head><body>Don't panic</body></html>"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn source(days: u32, last_entry: LastEntryPolicy) -> ScriptSource {
        ScriptSource {
            url: "https://channel.example.test/schedule".to_string(),
            variable: "window.schedule".to_string(),
            source_tz: Chicago,
            output_tz: New_York,
            days,
            last_entry,
        }
    }

    #[test]
    fn extracts_the_named_assignment() {
        let schedule = extract_schedule(PAGE, "window.schedule").unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule["Monday"]["08:00"], "Morning Cartoons");

        let settings = extract_schedule(PAGE, "settings");
        assert!(matches!(settings, Err(EpgError::MalformedSchedule(_))));
    }

    #[test]
    fn missing_assignment_is_schedule_not_found() {
        assert!(matches!(
            extract_schedule(PAGE, "guide"),
            Err(EpgError::ScheduleNotFound(_))
        ));
        assert!(matches!(
            extract_schedule("var guide = { Monday: {", "guide"),
            Err(EpgError::ScheduleNotFound(_))
        ));
    }

    #[test]
    fn day_is_sorted_and_chained() {
        let schedule = extract_schedule(PAGE, "window.schedule").unwrap();
        let monday = programmes_for_date(
            &schedule["Monday"],
            date(2025, 1, 6),
            Chicago,
            LastEntryPolicy::default(),
        )
        .unwrap();
        let titles: Vec<_> = monday.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Morning Cartoons", "Brunch Show", "Late Movie"]);
        assert_eq!(monday[0].stop, monday[1].start);
        assert_eq!(monday[1].stop, monday[2].start);
        // the blank 23:45 slot still ends the movie
        assert_eq!(
            monday[2].stop.naive_local(),
            date(2025, 1, 6).and_hms_opt(23, 45, 0).unwrap()
        );
    }

    #[test]
    fn last_entry_policies() {
        let schedule = extract_schedule(PAGE, "window.schedule").unwrap();
        let tuesday = &schedule["Tuesday"];

        let fixed = programmes_for_date(tuesday, date(2025, 1, 7), Chicago, LastEntryPolicy::FixedMinutes(30)).unwrap();
        assert_eq!(fixed[0].stop.naive_local(), date(2025, 1, 7).and_hms_opt(7, 30, 0).unwrap());

        let eod = programmes_for_date(tuesday, date(2025, 1, 7), Chicago, LastEntryPolicy::EndOfDay).unwrap();
        assert_eq!(eod[0].stop.naive_local(), date(2025, 1, 7).and_hms_opt(23, 59, 0).unwrap());
    }

    #[test]
    fn oversized_last_entry_fails_the_day() {
        let schedule = extract_schedule(PAGE, "window.schedule").unwrap();
        let tuesday = &schedule["Tuesday"];
        for minutes in [i64::MAX / 2, 0] {
            let out = programmes_for_date(
                tuesday,
                date(2025, 1, 7),
                Chicago,
                LastEntryPolicy::FixedMinutes(minutes),
            );
            assert!(matches!(out, Err(EpgError::DurationOutOfRange(m)) if m == minutes));
        }
        assert!(normalize(
            PAGE,
            &source(3, LastEntryPolicy::FixedMinutes(i64::MAX / 2)),
            date(2025, 1, 6)
        )
        .is_err());
    }

    #[test]
    fn equal_times_wrap_to_next_day() {
        let mut day = DaySchedule::new();
        day.insert("21:00".into(), "First".into());
        day.insert("9:00 PM".into(), "Second".into());
        let out = programmes_for_date(&day, date(2025, 1, 6), Chicago, LastEntryPolicy::default()).unwrap();
        assert_eq!(
            out[0].stop.naive_local(),
            date(2025, 1, 7).and_hms_opt(21, 0, 0).unwrap()
        );
    }

    #[test]
    fn window_converts_and_skips_unlisted_days() {
        let out = normalize(PAGE, &source(3, LastEntryPolicy::default()), date(2025, 1, 6)).unwrap();
        let titles: Vec<_> = out.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Morning Cartoons", "Brunch Show", "Late Movie", "Early Bird"]);
        assert_eq!(to_xmltv_time(&out[0].start), "20250106090000 -0500");
        assert_eq!(to_xmltv_time(&out[3].stop), "20250107083000 -0500");
    }

    #[test]
    fn policy_deserializes_from_config() {
        let fixed: LastEntryPolicy = serde_json::from_str(r#"{"fixed_minutes": 45}"#).unwrap();
        assert_eq!(fixed, LastEntryPolicy::FixedMinutes(45));
        let eod: LastEntryPolicy = serde_json::from_str(r#""end_of_day""#).unwrap();
        assert_eq!(eod, LastEntryPolicy::EndOfDay);
    }
}
