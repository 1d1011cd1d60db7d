use chrono::DateTime;
use chrono_tz::Tz;
use log::warn;
use serde::Deserialize;

/// One scheduled showing, already converted to the channel's output zone.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Programme {
    pub(crate) title: String,
    pub(crate) start: DateTime<Tz>,
    pub(crate) stop: DateTime<Tz>,
    pub(crate) description: Option<String>,
    pub(crate) episode_number: Option<i64>,
    pub(crate) icon_url: Option<String>,
}

impl Programme {
    pub(crate) fn new(title: impl Into<String>, start: DateTime<Tz>, stop: DateTime<Tz>) -> Self {
        Programme {
            title: title.into(),
            start,
            stop,
            description: None,
            episode_number: None,
            icon_url: None,
        }
    }
}

/// Where and under which identity a channel's guide is written.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChannelConfig {
    pub(crate) id: String,
    pub(crate) display_name: String,
    pub(crate) output_file_name: String,
}

/// Stable sort by start, then drop anything that doesn't run forward in time.
pub(crate) fn finalize(mut programmes: Vec<Programme>) -> Vec<Programme> {
    programmes.sort_by_key(|p| p.start);
    programmes.retain(|p| {
        let ok = p.stop > p.start;
        if !ok {
            warn!(
                "Dropping '{}': stop {} is not after start {}",
                p.title, p.stop, p.start
            );
        }
        ok
    });
    programmes
}
