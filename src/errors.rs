use thiserror::Error;

pub(crate) type Result<T> = std::result::Result<T, MetricsError>;

// Error kinds for the metrics engine. Each one is terminal for the request
// that raised it; the caller reports it and keeps the rest of the run alive.
#[derive(Debug, Error)]
pub(crate) enum MetricsError {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
