/// Failures raised while fetching or normalizing a schedule.
///
/// Record-level kinds (`MalformedTimestamp`, `MalformedTimeRange`,
/// `NonexistentLocalTime`) are logged and skipped by the normalizers; the
/// rest abort the channel they occur in.
#[derive(Debug, thiserror::Error)]
pub(crate) enum EpgError {
    #[error("fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("schedule not found: {0}")]
    ScheduleNotFound(String),

    #[error("malformed schedule: {0}")]
    MalformedSchedule(String),

    #[error("malformed timestamp '{0}'")]
    MalformedTimestamp(String),

    #[error("malformed time range '{0}'")]
    MalformedTimeRange(String),

    #[error("local time {0} does not exist in the source timezone")]
    NonexistentLocalTime(String),

    #[error("could not find header row with weekday names")]
    HeaderNotFound,

    #[error("fallback of {0} minute(s) is out of range")]
    DurationOutOfRange(i64),

    #[error(transparent)]
    Pattern(#[from] regex_lite::Error),
}

impl EpgError {
    pub(crate) fn fetch(url: &str, reason: impl ToString) -> Self {
        EpgError::FetchFailed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
