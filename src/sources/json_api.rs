//! Shows published by a JSON REST endpoint.
//!
//! The API only gives start times, so every show runs until the next one
//! begins and the last show gets a fixed duration.

use crate::{
    error::EpgError,
    fetch::Fetcher,
    programme::{finalize, Programme},
    time::{parse_iso, positive_minutes, today_in},
};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct JsonApiSource {
    /// Endpoint; `{date}` is replaced with today's date (`YYYY-MM-DD`).
    pub(crate) url: String,
    #[serde(default = "default_output_tz")]
    pub(crate) output_tz: Tz,
    #[serde(default = "default_fallback_minutes")]
    pub(crate) fallback_minutes: i64,
}

fn default_output_tz() -> Tz {
    chrono_tz::UTC
}

fn default_fallback_minutes() -> i64 {
    12
}

impl JsonApiSource {
    pub(crate) fn url_for(&self, today: NaiveDate) -> String {
        self.url
            .replace("{date}", &today.format("%Y-%m-%d").to_string())
    }
}

#[derive(Deserialize)]
struct Show {
    #[serde(rename = "startDate")]
    start_date: Option<String>,
    name: Option<String>,
    #[serde(rename = "episodeNumber")]
    episode_number: Option<Value>,
    info: Option<ShowInfo>,
}

#[derive(Deserialize)]
struct ShowInfo {
    fullname: Option<String>,
    episode: Option<String>,
    image: Option<String>,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn episode_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `None` when the API answers with a non-success status or lists no shows;
/// the channel's guide is then left as it is.
pub(crate) async fn fetch_programmes<F: Fetcher>(
    fetcher: &F,
    source: &JsonApiSource,
    now: DateTime<Utc>,
) -> Result<Option<Vec<Programme>>, EpgError> {
    let url = source.url_for(today_in(source.output_tz, now));
    let programmes = match fetcher.text_if_ok(&url).await? {
        Some(body) => normalize(&body, source)?,
        None => vec![],
    };
    if programmes.is_empty() {
        info!("No shows to convert.");
        return Ok(None);
    }
    Ok(Some(programmes))
}

/// Turns the API's JSON array into programmes in `source.output_tz`.
pub(crate) fn normalize(payload: &str, source: &JsonApiSource) -> Result<Vec<Programme>, EpgError> {
    let items = match serde_json::from_str::<Value>(payload) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            return Err(EpgError::ScheduleNotFound(
                "expected a JSON array of shows".to_string(),
            ))
        }
        Err(e) => return Err(EpgError::ScheduleNotFound(format!("invalid JSON: {e}"))),
    };
    debug!("Received {} show(s)", items.len());

    let mut timed = Vec::with_capacity(items.len());
    for item in items {
        let show: Show = match serde_json::from_value(item) {
            Ok(show) => show,
            Err(e) => {
                warn!("Skipping unreadable show: {e}");
                continue;
            }
        };
        let Some(raw) = show.start_date.as_deref() else {
            warn!("Skipping show without startDate");
            continue;
        };
        match parse_iso(raw) {
            Ok(start) => timed.push((start, show)),
            Err(e) => warn!("Skipping show: {e}"),
        }
    }
    timed.sort_by_key(|(start, _)| *start);

    let tz = source.output_tz;
    let fallback = positive_minutes(source.fallback_minutes)?;
    let mut programmes = Vec::with_capacity(timed.len());
    for (i, (start, show)) in timed.iter().enumerate() {
        let stop = match timed.get(i + 1) {
            Some((next, _)) => *next,
            None => start
                .checked_add_signed(fallback)
                .ok_or(EpgError::DurationOutOfRange(source.fallback_minutes))?,
        };
        let info = show.info.as_ref();

        let title = non_empty(info.and_then(|i| i.fullname.as_deref()))
            .or_else(|| non_empty(show.name.as_deref()));
        let Some(title) = title else {
            warn!("Skipping untitled show at {start}");
            continue;
        };

        programmes.push(Programme {
            title: title.to_string(),
            start: start.with_timezone(&tz),
            stop: stop.with_timezone(&tz),
            description: non_empty(info.and_then(|i| i.episode.as_deref())).map(String::from),
            episode_number: show.episode_number.as_ref().and_then(episode_number),
            icon_url: non_empty(info.and_then(|i| i.image.as_deref())).map(String::from),
        });
    }
    Ok(finalize(programmes))
}
