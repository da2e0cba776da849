use thiserror::Error;

/// Failure to turn a channel statistics payload into a [`StatsRecord`].
///
/// [`StatsRecord`]: crate::wire::StatsRecord
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid count for '{field}': {value:?} is not a non-negative integer")]
    InvalidCount { field: &'static str, value: String },
}

/// Common error type for push stream components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using the push stream [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
