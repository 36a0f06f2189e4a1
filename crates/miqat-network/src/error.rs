//! Provider failure values.

use miqat_types::CalculationMethod;
use thiserror::Error;

/// Why a remote provider could not answer.
///
/// Returned as a value so the orchestrator can move on to the next layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    /// The request did not complete within the configured timeout.
    #[error("Provider timed out")]
    Timeout,

    /// Connection failure or a server-side (5xx) error.
    #[error("Provider unreachable: {0}")]
    Unreachable(String),

    /// The provider answered with something that is not a usable schedule.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// HTTP 429.
    #[error("Provider rate limit exceeded")]
    RateLimited,

    /// The provider has no equivalent of the requested method.
    #[error("Provider does not support method {0}")]
    UnsupportedMethod(CalculationMethod),
}

impl ProviderError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidResponse(reason.into())
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Unreachable(_) => "unreachable",
            Self::InvalidResponse(_) => "invalid_response",
            Self::RateLimited => "rate_limited",
            Self::UnsupportedMethod(_) => "unsupported_method",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            status_error(status)
        } else {
            Self::Unreachable(e.to_string())
        }
    }
}

/// Maps a non-success HTTP status.
pub(crate) fn status_error(status: reqwest::StatusCode) -> ProviderError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        ProviderError::RateLimited
    } else if status.is_server_error() {
        ProviderError::Unreachable(format!("HTTP {}", status))
    } else {
        ProviderError::InvalidResponse(format!("HTTP {}", status))
    }
}
