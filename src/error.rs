//! Custom error types for pubmed-company-finder.
//!
//! Classification and export never fail on their own; everything here
//! originates in retrieval, parsing, configuration or file output.

use thiserror::Error;

/// Main error type for pubmed-company-finder operations.
#[derive(Debug, Error)]
pub enum FinderError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// XML/JSON response could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limited by the E-utilities API
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// E-utilities returned a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: i32,
        /// Error message
        message: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl FinderError {
    /// Whether this error means the retrieval stage failed as a whole
    /// (network, API status, rate limiting or a malformed top-level response).
    pub fn is_retrieval_failure(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Parse(_) | Self::RateLimited(_) | Self::Api { .. } | Self::Json(_)
        )
    }
}

/// Result type alias using `FinderError`
pub type Result<T> = std::result::Result<T, FinderError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| FinderError::Parse(msg.to_string()))
    }
}
