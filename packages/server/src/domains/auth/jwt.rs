use anyhow::Result;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::common::FallbackError;
use crate::kernel::BaseFallbackVerifier;

/// JWT Claims - the subset of a Supabase access token we read
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>, // Subject (user id)
    pub exp: i64, // Expiration timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>, // Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// JWT Service - verifies provider-issued tokens locally with the shared
/// HS256 secret. Used only when the identity provider cannot be reached.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create new JWT service with the provider's JWT secret
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Create a token for `sub` expiring `ttl` from now (negative for an
    /// already expired token). Used by tests and local tooling.
    pub fn create_token(&self, sub: &str, ttl: chrono::Duration) -> Result<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: Some(sub.to_string()),
            exp: (now + ttl).timestamp(),
            iat: Some(now.timestamp()),
            role: Some("authenticated".to_string()),
            email: None,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a JWT token
    ///
    /// Returns claims if the signature is valid and the token is not expired
    pub fn verify_token(&self, token: &str) -> Result<Claims, FallbackError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Supabase sets aud = "authenticated"; the signature is what we trust.
        validation.validate_aud = false;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => FallbackError::Expired,
                ErrorKind::InvalidKeyFormat
                | ErrorKind::InvalidRsaKey(_)
                | ErrorKind::InvalidEcdsaKey
                | ErrorKind::RsaFailedSigning
                | ErrorKind::Crypto(_) => FallbackError::Misconfigured(e.to_string()),
                _ => FallbackError::Invalid(e.to_string()),
            })
    }
}

impl BaseFallbackVerifier for JwtService {
    fn verify(&self, token: &str) -> Result<String, FallbackError> {
        self.verify_token(token)?
            .sub
            .filter(|sub| !sub.is_empty())
            .ok_or(FallbackError::MissingSubject)
    }
}
