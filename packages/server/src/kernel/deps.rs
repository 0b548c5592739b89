//! Server dependencies (using traits for testability)
//!
//! This module provides the central dependency container shared by the
//! authorizer, the route handlers and the event workers. Every external
//! collaborator sits behind a `Base*` trait so tests can swap it out.

use async_trait::async_trait;
use std::sync::Arc;
use supabase::{SupabaseClient, SupabaseError};

use crate::common::ProviderError;
use crate::kernel::{BaseEventRunner, BaseFallbackVerifier, BaseRecordStore, BaseTokenVerifier};

// =============================================================================
// SupabaseClient Adapter (implements BaseTokenVerifier trait)
// =============================================================================

/// Wrapper around SupabaseClient that implements BaseTokenVerifier trait
pub struct SupabaseTokenVerifier(pub Arc<SupabaseClient>);

impl SupabaseTokenVerifier {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self(client)
    }
}

#[async_trait]
impl BaseTokenVerifier for SupabaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<String, ProviderError> {
        self.0
            .get_user(token)
            .await
            .map(|user| user.id)
            .map_err(|e| match e {
                SupabaseError::TokenRejected(msg) => ProviderError::Rejected(msg),
                other => ProviderError::Unavailable(other.to_string()),
            })
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to handlers (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub record_store: Arc<dyn BaseRecordStore>,
    /// Identity provider lookup
    pub token_verifier: Arc<dyn BaseTokenVerifier>,
    /// Local HS256 check, only present when a JWT secret is configured
    pub fallback_verifier: Option<Arc<dyn BaseFallbackVerifier>>,
    pub event_runner: Arc<dyn BaseEventRunner>,
}

impl ServerDeps {
    pub fn new(
        record_store: Arc<dyn BaseRecordStore>,
        token_verifier: Arc<dyn BaseTokenVerifier>,
        fallback_verifier: Option<Arc<dyn BaseFallbackVerifier>>,
        event_runner: Arc<dyn BaseEventRunner>,
    ) -> Self {
        Self {
            record_store,
            token_verifier,
            fallback_verifier,
            event_runner,
        }
    }
}
