//! Error types for stock analysis operations

use thiserror::Error;

/// Stock analysis specific errors
#[derive(Debug, Error)]
pub enum StockError {
    /// API request failed
    #[error("API error: {0}")]
    ApiError(String),

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Data not available for the requested symbol
    #[error("Data not available for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    /// A required API key is not configured
    #[error("Missing API key: set {0}")]
    MissingApiKey(&'static str),

    /// Provider answered with a non-success status
    #[error("{provider} returned HTTP {status}: {body}")]
    HttpStatus {
        provider: String,
        status: u16,
        body: String,
    },

    /// Request did not finish within the configured timeout
    #[error("Request to {provider} timed out")]
    Timeout { provider: String },

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// LLM call made by an adapter (scrape summaries) failed
    #[error("LLM error: {0}")]
    LlmError(#[from] crew_llm::LLMError),

    /// Crew validation or task failure
    #[error("Workflow error: {0}")]
    WorkflowError(#[from] crew_workflow::WorkflowError),

    /// Prompt template failed to render
    #[error("Template error: {0}")]
    TemplateError(String),

    /// Caller supplied unusable input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Report or chart file could not be written
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl StockError {
    /// Whether repeating the same request may succeed
    ///
    /// Timeouts, connection failures, HTTP 429 and 5xx are transient; any
    /// other failure is returned to the caller right away.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::RateLimitExceeded { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::NetworkError(e) => e.is_timeout() || e.is_connect(),
            Self::LlmError(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Result type alias for stock operations
pub type Result<T> = std::result::Result<T, StockError>;

/// Convert StockError to crew_core::Error
impl From<StockError> for crew_core::Error {
    fn from(err: StockError) -> Self {
        match err {
            StockError::InvalidInput(msg) | StockError::InvalidSymbol(msg) => {
                crew_core::Error::InvalidInput(msg)
            }
            other => crew_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}

/// Convert crew_core::Error to StockError
impl From<crew_core::Error> for StockError {
    fn from(err: crew_core::Error) -> Self {
        match err {
            crew_core::Error::InvalidInput(msg) => StockError::InvalidInput(msg),
            other => StockError::Other(other.to_string()),
        }
    }
}

impl From<minijinja::Error> for StockError {
    fn from(err: minijinja::Error) -> Self {
        StockError::TemplateError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StockError::InvalidSymbol("INVALID".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: INVALID");

        let err = StockError::DataUnavailable {
            symbol: "AAPL".to_string(),
            reason: "No data found".to_string(),
        };
        assert_eq!(err.to_string(), "Data not available for AAPL: No data found");

        let err = StockError::MissingApiKey("SERPER_API_KEY");
        assert_eq!(err.to_string(), "Missing API key: set SERPER_API_KEY");
    }

    #[test]
    fn test_retryable_classification() {
        let status = |status| StockError::HttpStatus {
            provider: "serper".to_string(),
            status,
            body: String::new(),
        };
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(401).is_retryable());

        assert!(
            StockError::Timeout {
                provider: "sec".to_string()
            }
            .is_retryable()
        );
        assert!(!StockError::MissingApiKey("SEC_API_API_KEY").is_retryable());
        assert!(!StockError::InvalidSymbol("ZZZZ".to_string()).is_retryable());
    }

    #[test]
    fn test_error_conversion() {
        let stock_err = StockError::ApiError("Test error".to_string());
        let core_err: crew_core::Error = stock_err.into();

        match core_err {
            crew_core::Error::ProcessingFailed(msg) => {
                assert!(msg.contains("API error"));
            }
            _ => panic!("Expected ProcessingFailed variant"),
        }

        let core_err: crew_core::Error = StockError::InvalidInput("empty".to_string()).into();
        assert!(matches!(core_err, crew_core::Error::InvalidInput(_)));
    }
}
