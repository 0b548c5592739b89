//! Minimal Supabase Auth client
//!
//! Only the piece the API server needs: resolving a user access token to the
//! user it was issued for.
//!
//! ```rust,ignore
//! use supabase::{SupabaseClient, SupabaseOptions};
//!
//! let client = SupabaseClient::new(SupabaseOptions {
//!     url: "https://project.supabase.co".into(),
//!     service_role_key: "service-role-key".into(),
//!     timeout: Duration::from_secs(10),
//! });
//! let user = client.get_user(token).await?;
//! ```

pub mod error;
pub mod models;

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use tracing::{debug, warn};

pub use error::{Result, SupabaseError};
pub use models::User;

use crate::models::ErrorBody;

#[derive(Debug, Clone)]
pub struct SupabaseOptions {
    pub url: String,
    pub service_role_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http_client: Client,
    options: SupabaseOptions,
}

impl SupabaseClient {
    pub fn new(options: SupabaseOptions) -> Self {
        let http_client = Client::builder()
            .timeout(options.timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build Supabase HTTP client, using defaults");
                Client::new()
            });

        Self {
            http_client,
            options,
        }
    }

    /// True when both the project URL and the service key are present.
    pub fn is_configured(&self) -> bool {
        !self.options.url.trim().is_empty() && !self.options.service_role_key.trim().is_empty()
    }

    /// Resolve an access token to its user.
    ///
    /// 401/403/422 from the auth server mean the token was looked at and
    /// refused; those come back as [`SupabaseError::TokenRejected`].
    /// Everything else, a 404 from a wrong project URL included, is a
    /// client, network or server problem.
    pub async fn get_user(&self, access_token: &str) -> Result<User> {
        if !self.is_configured() {
            return Err(SupabaseError::Config(
                "SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY must be set".into(),
            ));
        }

        let url = format!("{}/auth/v1/user", self.options.url.trim_end_matches('/'));

        let response = self
            .http_client
            .get(url)
            .header("apikey", &self.options.service_role_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| SupabaseError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<User>()
                .await
                .map_err(|e| SupabaseError::Parse(format!("Failed to parse user: {}", e)));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

        debug!(status = status.as_u16(), message = %message, "Supabase rejected get_user");

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(SupabaseError::TokenRejected(message))
            }
            _ => Err(SupabaseError::Api {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SupabaseClient {
        SupabaseClient::new(SupabaseOptions {
            url: server.uri(),
            service_role_key: "service-key".to_string(),
            timeout: Duration::from_secs(5),
        })
    }

    #[tokio::test]
    async fn get_user_returns_user_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer good-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "user-123",
                "aud": "authenticated",
                "email": "someone@example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = client_for(&server).get_user("good-token").await.unwrap();
        assert_eq!(user.id, "user-123");
        assert_eq!(user.email.as_deref(), Some("someone@example.com"));
    }

    #[tokio::test]
    async fn unauthorized_is_token_rejection() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "code": 401,
                "error_code": "bad_jwt",
                "msg": "invalid JWT: token is expired"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).get_user("stale").await.unwrap_err();
        assert!(err.is_token_rejection());
        assert!(err.to_string().contains("token is expired"));
    }

    #[tokio::test]
    async fn server_error_is_not_token_rejection() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).get_user("whatever").await.unwrap_err();
        assert!(matches!(err, SupabaseError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn not_found_is_not_token_rejection() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).get_user("token").await.unwrap_err();
        assert!(!err.is_token_rejection());
        assert!(matches!(err, SupabaseError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn missing_configuration_skips_the_network() {
        let client = SupabaseClient::new(SupabaseOptions {
            url: String::new(),
            service_role_key: String::new(),
            timeout: Duration::from_secs(1),
        });

        assert!(!client.is_configured());
        let err = client.get_user("token").await.unwrap_err();
        assert!(matches!(err, SupabaseError::Config(_)));
    }

    #[tokio::test]
    async fn garbage_success_body_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_user("token").await.unwrap_err();
        assert!(matches!(err, SupabaseError::Parse(_)));
    }
}
