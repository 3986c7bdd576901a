use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Required columns or fields are absent or unparseable.
    #[error("format error: {0}")]
    Format(String),

    /// An input produced zero usable activities.
    #[error("no activities found: {0}")]
    NoActivities(String),

    /// The optional AI service is unreachable, misconfigured or returned garbage.
    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("dependency cycle detected between activities: {}", .0.join(" -> "))]
    CycleDetected(Vec<String>),

    #[error("activity '{0}' appears more than once")]
    DuplicateActivity(String),

    #[error("activity '{0}' lists itself as a predecessor")]
    SelfDependency(String),

    /// Zero or negative, above `MAX_DURATION_DAYS`, or past the end of the calendar.
    #[error("activity '{name}' has invalid duration {duration} days")]
    InvalidDuration { name: String, duration: i64 },

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("dataframe error: {0}")]
    DataFrame(#[from] polars::prelude::PolarsError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ScheduleError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub fn external(message: impl Into<String>) -> Self {
        Self::ExternalService(message.into())
    }

    /// True for failures of the optional AI layer, which callers always recover from.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::ExternalService(_) | Self::Http(_))
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
