//! Auth domain - local verification of provider-issued access tokens
//!
//! The request authorizer itself lives in `server::middleware::auth`; this
//! module only holds the HS256 fallback check it falls back to.

pub mod jwt;

pub use jwt::{Claims, JwtService};
