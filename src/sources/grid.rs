//! Weekly grid published as a spreadsheet CSV export.
//!
//! One header row names the weekdays, one column holds `start - end` time
//! ranges, and every other cell is the title airing in that slot.

use crate::{
    csv::parse_rows,
    error::EpgError,
    fetch::Fetcher,
    programme::{finalize, Programme},
    time::{date_window, localize, parse_clock, parse_full_weekday, today_in},
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use log::{debug, info, warn};
use regex_lite::Regex;
use serde::Deserialize;
use std::collections::HashMap;

const RANGE_PATTERN: &str = r"^\s*(?P<start>[^-]+?)\s*-\s*(?P<end>.+?)\s*$";

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GridSource {
    pub(crate) url: String,
    /// Zone the sheet's clock times are written in.
    pub(crate) source_tz: Tz,
    pub(crate) output_tz: Tz,
    #[serde(default = "default_days")]
    pub(crate) days: u32,
    #[serde(default = "default_header_scan_rows")]
    pub(crate) header_scan_rows: usize,
}

fn default_days() -> u32 {
    3
}

fn default_header_scan_rows() -> usize {
    20
}

#[derive(Debug, PartialEq)]
pub(crate) struct GridLayout {
    pub(crate) header_row: usize,
    pub(crate) columns: HashMap<Weekday, usize>,
    pub(crate) time_col: usize,
}

/// Finds the first row (within `scan_rows`) naming at least three weekdays
/// in full.
///
/// The time column is the leftmost column no weekday claimed. This breaks
/// if the sheet ever puts a non-time column first.
pub(crate) fn locate_header(rows: &[Vec<String>], scan_rows: usize) -> Result<GridLayout, EpgError> {
    for (i, row) in rows.iter().take(scan_rows).enumerate() {
        let mut columns = HashMap::new();
        for (idx, cell) in row.iter().enumerate() {
            if let Some(day) = parse_full_weekday(cell) {
                columns.entry(day).or_insert(idx);
            }
        }
        if columns.len() < 3 {
            continue;
        }
        let time_col = (0..row.len())
            .find(|idx| !columns.values().any(|c| c == idx))
            .unwrap_or(0);
        debug!("Header at row {i}: {} weekday column(s), time column {time_col}", columns.len());
        return Ok(GridLayout {
            header_row: i,
            columns,
            time_col,
        });
    }
    Err(EpgError::HeaderNotFound)
}

/// Parses a cell like `3:50PM - 4:20PM` into its two clock times.
pub(crate) fn parse_time_range(cell: &str) -> Result<(NaiveTime, NaiveTime), EpgError> {
    split_range(&Regex::new(RANGE_PATTERN)?, cell)
}

fn split_range(re: &Regex, cell: &str) -> Result<(NaiveTime, NaiveTime), EpgError> {
    let malformed = || EpgError::MalformedTimeRange(cell.trim().to_string());
    let caps = re.captures(cell).ok_or_else(malformed)?;
    let start = parse_clock(&caps["start"]).map_err(|_| malformed())?;
    let end = parse_clock(&caps["end"]).map_err(|_| malformed())?;
    Ok((start, end))
}

/// Programmes airing on `date`, in `source_tz`.
pub(crate) fn programmes_for_date(
    rows: &[Vec<String>],
    layout: &GridLayout,
    date: NaiveDate,
    source_tz: Tz,
) -> Result<Vec<Programme>, EpgError> {
    let Some(&col) = layout.columns.get(&date.weekday()) else {
        debug!("No column for {}", date.format("%A"));
        return Ok(vec![]);
    };
    let range = Regex::new(RANGE_PATTERN)?;

    let mut programmes = vec![];
    for row in rows.iter().skip(layout.header_row + 1) {
        let time_cell = row.get(layout.time_col).map_or("", |c| c.trim());
        if time_cell.is_empty() || !range.is_match(time_cell) {
            continue;
        }
        let title = row.get(col).map_or("", |c| c.trim());
        if title.is_empty() {
            continue;
        }

        let (start_time, end_time) = match split_range(&range, time_cell) {
            Ok(range) => range,
            Err(e) => {
                warn!("Skipping row: {e}");
                continue;
            }
        };
        let start = date.and_time(start_time);
        let mut end = date.and_time(end_time);
        if end <= start {
            end += Duration::days(1);
        }

        match (localize(source_tz, start), localize(source_tz, end)) {
            (Ok(start), Ok(end)) => programmes.push(Programme::new(title, start, end)),
            (Err(e), _) | (_, Err(e)) => warn!("Skipping '{title}': {e}"),
        }
    }
    Ok(programmes)
}

/// Builds `source.days` days of programmes starting at `today`.
pub(crate) fn normalize(
    csv_text: &str,
    source: &GridSource,
    today: NaiveDate,
) -> Result<Vec<Programme>, EpgError> {
    let rows = parse_rows(csv_text);
    if rows.is_empty() {
        return Err(EpgError::ScheduleNotFound("empty CSV".to_string()));
    }
    let layout = locate_header(&rows, source.header_scan_rows)?;

    let dates: Vec<_> = date_window(today, source.days).collect();
    info!(
        "Target dates: {}",
        dates
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let tz = source.output_tz;
    let mut programmes = vec![];
    for date in dates {
        for mut p in programmes_for_date(&rows, &layout, date, source.source_tz)? {
            p.start = p.start.with_timezone(&tz);
            p.stop = p.stop.with_timezone(&tz);
            programmes.push(p);
        }
    }
    Ok(finalize(programmes))
}

pub(crate) async fn fetch_programmes<F: Fetcher>(
    fetcher: &F,
    source: &GridSource,
    now: DateTime<Utc>,
) -> Result<Vec<Programme>, EpgError> {
    info!("Fetching CSV...");
    let body = fetcher.text(&source.url).await?;
    normalize(&body, source, today_in(source.output_tz, now))
}
