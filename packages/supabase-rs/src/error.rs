//! Error types for the Supabase client.

use thiserror::Error;

/// Result type for Supabase client operations.
pub type Result<T> = std::result::Result<T, SupabaseError>;

/// Supabase client errors.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Configuration error (missing URL or API key)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// The auth server looked at the token and refused it
    #[error("Token rejected: {0}")]
    TokenRejected(String),

    /// Any other non-2xx response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl SupabaseError {
    /// True when the failure says something about the token itself rather
    /// than about the client or the network.
    pub fn is_token_rejection(&self) -> bool {
        matches!(self, SupabaseError::TokenRejected(_))
    }
}
