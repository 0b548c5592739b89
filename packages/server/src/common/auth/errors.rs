use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Why the request authorizer turned a request away.
///
/// The display string is exactly what the caller sees in `{"error": ...}`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Invalid Authorization header format")]
    InvalidHeaderFormat,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid token: missing user ID")]
    MissingUserId,

    #[error("Token verification failed")]
    VerificationFailed,

    /// The verifier itself is broken. The detail is for logs only.
    #[error("Authentication failed")]
    Misconfigured(String),
}

impl AuthRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthRejection::AuthenticationRequired
            | AuthRejection::InvalidHeaderFormat
            | AuthRejection::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthRejection::InvalidToken
            | AuthRejection::MissingUserId
            | AuthRejection::VerificationFailed => StatusCode::FORBIDDEN,
            AuthRejection::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Failure reported by the identity provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider saw the token and refused it.
    #[error("token rejected by provider: {0}")]
    Rejected(String),

    /// The provider could not be asked (network, config, server error).
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by the local signature check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FallbackError {
    #[error("token expired")]
    Expired,

    #[error("token has no subject")]
    MissingSubject,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("verifier misconfigured: {0}")]
    Misconfigured(String),
}

impl From<FallbackError> for AuthRejection {
    fn from(err: FallbackError) -> Self {
        match err {
            FallbackError::Expired => AuthRejection::TokenExpired,
            FallbackError::MissingSubject => AuthRejection::MissingUserId,
            FallbackError::Invalid(_) => AuthRejection::InvalidToken,
            FallbackError::Misconfigured(detail) => AuthRejection::Misconfigured(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_misconfiguration_is_a_server_error() {
        let all = [
            AuthRejection::AuthenticationRequired,
            AuthRejection::InvalidHeaderFormat,
            AuthRejection::TokenExpired,
            AuthRejection::InvalidToken,
            AuthRejection::MissingUserId,
            AuthRejection::VerificationFailed,
        ];
        for rejection in all {
            assert!(rejection.status().is_client_error(), "{rejection:?}");
        }
        assert_eq!(
            AuthRejection::Misconfigured("bad key".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn misconfigured_message_hides_detail() {
        let rejection = AuthRejection::Misconfigured("secret=hunter2".into());
        assert_eq!(rejection.to_string(), "Authentication failed");
    }

    #[test]
    fn fallback_errors_map_to_rejections() {
        assert_eq!(AuthRejection::from(FallbackError::Expired), AuthRejection::TokenExpired);
        assert_eq!(
            AuthRejection::from(FallbackError::Invalid("bad signature".into())),
            AuthRejection::InvalidToken
        );
        assert_eq!(
            AuthRejection::from(FallbackError::MissingSubject),
            AuthRejection::MissingUserId
        );
    }
}
