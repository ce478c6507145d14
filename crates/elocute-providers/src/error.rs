//! Provider error types.

use thiserror::Error;

use elocute_core::error::RecognitionError;

/// Errors that can occur when talking to a remote speech service.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The response body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl From<ProviderError> for RecognitionError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::AuthenticationFailed(msg) => RecognitionError::AuthenticationFailed(msg),
            ProviderError::Timeout(secs) => RecognitionError::Timeout(secs),
            other => RecognitionError::Unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_recognition_errors() {
        let auth: RecognitionError = ProviderError::AuthenticationFailed("bad key".into()).into();
        assert!(auth.is_permanent());

        let timeout: RecognitionError = ProviderError::Timeout(30).into();
        assert!(matches!(timeout, RecognitionError::Timeout(30)));

        let limited: RecognitionError = ProviderError::RateLimited { retry_after_ms: 5000 }.into();
        assert!(limited.to_string().contains("rate limited"));
        assert!(!limited.is_permanent());
    }
}
