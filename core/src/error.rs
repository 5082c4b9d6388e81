use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Underlying data source missing or unreadable. Fatal for the request.
    #[error("data source unavailable: {path}")]
    DataUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data source: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A requested aggregation key does not name a column of the table.
    /// Client-input error, not a server failure.
    #[error("unknown grouping column: {0}")]
    InvalidGrouping(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
