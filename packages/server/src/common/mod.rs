// Common types and utilities shared across the application

pub mod auth;
pub mod error;
pub mod pagination;

pub use auth::{AuthRejection, AuthUser, FallbackError, ProviderError, DEV_USER_ID};
pub use error::{ApiError, ApiResult, StoreError};
pub use pagination::{PageLimitQuery, PageRequest, PageSizeQuery};
