use axum::{
    extract::Request,
    http::{HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::common::{AuthRejection, AuthUser, ProviderError};
use crate::config::AppEnv;
use crate::kernel::{BaseFallbackVerifier, BaseTokenVerifier, ServerDeps};

/// Header carrying the development shared secret
pub const DEV_API_KEY_HEADER: &str = "x-api-key";

/// What the authorizer decided for a request that may proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// CORS preflight; no identity is attached.
    Preflight,
    Authenticated(AuthUser),
}

/// Resolves the caller of a protected route.
///
/// Order: OPTIONS passes, then the development key (development mode only),
/// then `Authorization: Bearer <token>` checked with the identity provider,
/// with the local signature check as fallback when the provider is down.
pub struct Authorizer {
    mode: AppEnv,
    dev_api_key: String,
    token_verifier: Arc<dyn BaseTokenVerifier>,
    fallback_verifier: Option<Arc<dyn BaseFallbackVerifier>>,
}

impl Authorizer {
    pub fn new(
        mode: AppEnv,
        dev_api_key: impl Into<String>,
        token_verifier: Arc<dyn BaseTokenVerifier>,
        fallback_verifier: Option<Arc<dyn BaseFallbackVerifier>>,
    ) -> Self {
        Self {
            mode,
            dev_api_key: dev_api_key.into(),
            token_verifier,
            fallback_verifier,
        }
    }

    pub fn from_deps(mode: AppEnv, dev_api_key: impl Into<String>, deps: &ServerDeps) -> Self {
        Self::new(
            mode,
            dev_api_key,
            deps.token_verifier.clone(),
            deps.fallback_verifier.clone(),
        )
    }

    pub async fn authorize(
        &self,
        method: &Method,
        headers: &HeaderMap,
    ) -> Result<AuthOutcome, AuthRejection> {
        if method == Method::OPTIONS {
            return Ok(AuthOutcome::Preflight);
        }

        if self.dev_key_matches(headers) {
            debug!("Development API key accepted");
            return Ok(AuthOutcome::Authenticated(AuthUser::development()));
        }

        let token = bearer_token(headers)?;

        match self.token_verifier.verify(token).await {
            Ok(user_id) if user_id.is_empty() => Err(AuthRejection::MissingUserId),
            Ok(user_id) => Ok(AuthOutcome::Authenticated(AuthUser::new(user_id))),
            Err(ProviderError::Rejected(reason)) => {
                debug!(reason = %reason, "Identity provider rejected token");
                Err(AuthRejection::InvalidToken)
            }
            Err(ProviderError::Unavailable(reason)) => {
                warn!(reason = %reason, "Identity provider unavailable, trying local verification");
                self.verify_locally(token)
            }
        }
    }

    fn dev_key_matches(&self, headers: &HeaderMap) -> bool {
        if self.mode != AppEnv::Development || self.dev_api_key.is_empty() {
            return false;
        }
        headers
            .get(DEV_API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|key| key == self.dev_api_key)
    }

    fn verify_locally(&self, token: &str) -> Result<AuthOutcome, AuthRejection> {
        let Some(fallback) = &self.fallback_verifier else {
            return Err(AuthRejection::VerificationFailed);
        };

        let user_id = fallback.verify(token)?;
        Ok(AuthOutcome::Authenticated(AuthUser::new(user_id)))
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme is case-insensitive and the header must split into exactly two
/// whitespace-separated parts.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthRejection> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthRejection::AuthenticationRequired)?
        .to_str()
        .map_err(|_| AuthRejection::InvalidHeaderFormat)?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthRejection::InvalidHeaderFormat),
    }
}

/// Loggable description of the `Authorization` header that never includes
/// the credential itself.
fn header_shape(headers: &HeaderMap) -> String {
    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return "missing".to_string();
    };
    let Ok(value) = value.to_str() else {
        return "non-ascii".to_string();
    };

    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        [] => "empty".to_string(),
        [scheme, _] if scheme.eq_ignore_ascii_case("bearer") => "bearer <redacted>".to_string(),
        [scheme, ..] => {
            // A bare token in the scheme position must not be logged
            let scheme = if scheme.len() <= 10 && scheme.chars().all(|c| c.is_ascii_alphabetic()) {
                scheme.to_ascii_lowercase()
            } else {
                "<redacted>".to_string()
            };
            format!("scheme={} parts={}", scheme, parts.len())
        }
    }
}

/// Authorization middleware for protected routes.
///
/// Rejections are answered here and never reach the handler. On success the
/// caller's [`AuthUser`] is added to request extensions.
pub async fn require_user(
    authorizer: Arc<Authorizer>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = authorizer
        .authorize(request.method(), request.headers())
        .await;

    match outcome {
        Ok(AuthOutcome::Preflight) => next.run(request).await,
        Ok(AuthOutcome::Authenticated(user)) => {
            debug!(user_id = %user.user_id, "Authenticated request");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(rejection) => {
            warn!(
                path = %request.uri().path(),
                header = %header_shape(request.headers()),
                reason = ?rejection,
                "Authorization rejected"
            );
            rejection.into_response()
        }
    }
}
