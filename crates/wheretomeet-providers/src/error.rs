//! Provider error taxonomy.
//!
//! Adapter failures collapse into one error type carrying a coarse code.
//! The code drives retry decisions and the protocol error mapping; the
//! message is for humans and logs only.

use std::fmt;
use thiserror::Error;

/// Result alias for adapter calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Coarse classification of an adapter failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Credentials missing, invalid, or expired.
    AuthenticationFailed,
    /// Credentials valid but not allowed for the resource.
    AuthorizationFailed,
    /// Could not connect, or the connection broke mid-request.
    NetworkError,
    /// The provider throttled us.
    RateLimited,
    /// The provider failed on its side (5xx).
    ServerError,
    /// The body did not have the shape the adapter expects.
    InvalidResponse,
    /// The resource does not exist.
    NotFound,
    /// The provider rejected the request as malformed.
    BadRequest,
    /// The adapter itself is misconfigured.
    ConfigurationError,
}

impl ProviderErrorCode {
    /// Transient failures, where a later attempt can succeed.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
        })
    }
}

/// A classified failure from a provider adapter.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    provider: Option<String>,
}

macro_rules! constructor {
    ($name:ident, $code:ident) => {
        pub fn $name(message: impl Into<String>) -> Self {
            Self::new(ProviderErrorCode::$code, message)
        }
    };
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
        }
    }

    constructor!(authentication, AuthenticationFailed);
    constructor!(authorization, AuthorizationFailed);
    constructor!(network, NetworkError);
    constructor!(rate_limited, RateLimited);
    constructor!(server, ServerError);
    constructor!(invalid_response, InvalidResponse);
    constructor!(not_found, NotFound);
    constructor!(bad_request, BadRequest);
    constructor!(configuration, ConfigurationError);

    /// Tags the error with the adapter that produced it, e.g.
    /// `"google-places"`.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provider {
            Some(provider) => write!(f, "[{}] {}: {}", provider, self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_codes_are_retryable() {
        let retryable = [
            ProviderErrorCode::NetworkError,
            ProviderErrorCode::RateLimited,
            ProviderErrorCode::ServerError,
        ];
        for code in retryable {
            assert!(code.is_retryable(), "{} should be retryable", code);
        }

        let terminal = [
            ProviderErrorCode::AuthenticationFailed,
            ProviderErrorCode::AuthorizationFailed,
            ProviderErrorCode::InvalidResponse,
            ProviderErrorCode::NotFound,
            ProviderErrorCode::BadRequest,
            ProviderErrorCode::ConfigurationError,
        ];
        for code in terminal {
            assert!(!code.is_retryable(), "{} should not be retryable", code);
        }
    }

    #[test]
    fn display_with_and_without_provider_tag() {
        let tagged = ProviderError::rate_limited("quota exhausted").with_provider("google-places");
        assert_eq!(
            tagged.to_string(),
            "[google-places] rate_limited: quota exhausted"
        );

        let plain = ProviderError::bad_request("radius must be positive");
        assert_eq!(plain.to_string(), "bad_request: radius must be positive");
    }

    #[test]
    fn constructors_set_the_matching_code() {
        let err = ProviderError::authentication("token expired");
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(err.message(), "token expired");
        assert!(err.provider().is_none());
        assert!(!err.is_retryable());
    }
}
