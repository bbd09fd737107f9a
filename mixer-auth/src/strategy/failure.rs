//! Recoverable authentication failures handed back to the host.

use std::fmt;

use crate::error::{Error, ErrorKind};

/// Why a callback did not produce an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The callback carried no authorization code.
    MissingCode,
    /// The callback `state` was not issued by this process or has expired.
    CsrfDetected,
    /// The provider rejected the code exchange with this OAuth error code.
    Provider(String),
    /// The token endpoint answered with something that is not a token response.
    InvalidCredentials,
    /// The token endpoint could not be reached in time.
    Timeout,
    /// The profile endpoint rejected the access token.
    Unauthorized,
    /// Any other profile fetch failure. Detail is logged, not surfaced.
    UnknownApiError,
}

/// A failed login, returned as a value rather than raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    pub reason: FailureReason,
    pub message: String,
}

impl AuthFailure {
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    pub fn missing_code(message: impl Into<String>) -> Self {
        Self::new(FailureReason::MissingCode, message)
    }

    pub fn csrf_detected() -> Self {
        Self::new(FailureReason::CsrfDetected, "state mismatch")
    }

    pub fn provider(error: &str, description: &str) -> Self {
        Self::new(FailureReason::Provider(error.to_string()), description)
    }

    pub fn unauthorized() -> Self {
        Self::new(FailureReason::Unauthorized, "unauthorized")
    }

    pub fn unknown_api_error() -> Self {
        Self::new(FailureReason::UnknownApiError, "unknown error")
    }

    /// Failure kind as reported to the host, e.g. `missing_code` or `token`.
    pub fn kind(&self) -> &str {
        match &self.reason {
            FailureReason::MissingCode => "missing_code",
            FailureReason::CsrfDetected => "csrf_detected",
            FailureReason::Provider(error) => error,
            FailureReason::InvalidCredentials => "invalid_credentials",
            FailureReason::Timeout => "timeout",
            FailureReason::Unauthorized | FailureReason::UnknownApiError => "token",
        }
    }
}

/// Token exchange errors become failures: transport problems read as a
/// timeout, anything the provider sent back as invalid credentials.
impl From<&Error> for AuthFailure {
    fn from(err: &Error) -> Self {
        match err.error_kind {
            ErrorKind::Http(_) => Self::new(FailureReason::Timeout, "token endpoint unreachable"),
            ErrorKind::OAuth(_) | ErrorKind::Config(_) => {
                Self::new(FailureReason::InvalidCredentials, "token exchange failed")
            }
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind())
        } else {
            write!(f, "{}: {}", self.kind(), self.message)
        }
    }
}

impl std::error::Error for AuthFailure {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{oauth_error, HttpErrorKind, OAuthErrorKind};

    #[test]
    fn test_kinds() {
        assert_eq!(AuthFailure::missing_code("x").kind(), "missing_code");
        assert_eq!(AuthFailure::csrf_detected().kind(), "csrf_detected");
        assert_eq!(AuthFailure::unauthorized().kind(), "token");
        assert_eq!(AuthFailure::unknown_api_error().kind(), "token");
        assert_eq!(
            AuthFailure::provider("access_denied", "user declined").kind(),
            "access_denied"
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(AuthFailure::unauthorized().message, "unauthorized");
        assert_eq!(AuthFailure::unknown_api_error().message, "unknown error");
    }

    #[test]
    fn test_from_transport_error() {
        let err = Error {
            source: None,
            error_kind: ErrorKind::Http(HttpErrorKind::Timeout),
        };
        assert_eq!(AuthFailure::from(&err).reason, FailureReason::Timeout);
    }

    #[test]
    fn test_from_invalid_response() {
        let err = oauth_error(OAuthErrorKind::InvalidResponse, "html");
        assert_eq!(
            AuthFailure::from(&err).reason,
            FailureReason::InvalidCredentials
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            AuthFailure::provider("access_denied", "user declined").to_string(),
            "access_denied: user declined"
        );
        assert_eq!(AuthFailure::provider("access_denied", "").to_string(), "access_denied");
    }
}
