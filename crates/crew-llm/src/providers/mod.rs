//! Concrete LLM provider implementations

#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};
#[cfg(feature = "openai")]
pub use openai::{OpenAIConfig, OpenAIProvider};

use crate::LLMError;

/// Map a non-success HTTP status to the matching error variant
pub(crate) fn status_error(status: reqwest::StatusCode, body: String, model: &str) -> LLMError {
    match status.as_u16() {
        401 | 403 => LLMError::AuthenticationFailed,
        429 => LLMError::RateLimitExceeded(body),
        400 => LLMError::InvalidRequest(body),
        404 => LLMError::ModelNotFound(model.to_string()),
        _ => LLMError::RequestFailed(format!("HTTP {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new(), "m"),
            LLMError::AuthenticationFailed
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "later".into(), "m"),
            LLMError::RateLimitExceeded(body) if body == "later"
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, String::new(), "mistral"),
            LLMError::ModelNotFound(model) if model == "mistral"
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "down".into(), "m"),
            LLMError::RequestFailed(msg) if msg.contains("502")
        ));
    }
}
