//! Authentication types shared by the authorizer, the verifiers and handlers.

mod errors;
mod identity;

pub use errors::{AuthRejection, FallbackError, ProviderError};
pub use identity::{AuthUser, DEV_USER_ID};
