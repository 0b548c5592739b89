// HTTP routes
pub mod campaigns;
pub mod email_servers;
pub mod fallback;
pub mod health;
pub mod leads;
pub mod senders;
pub mod settings;
pub mod templates;
pub mod webhooks;

pub use campaigns::*;
pub use email_servers::*;
pub use fallback::*;
pub use health::*;
pub use leads::*;
pub use senders::*;
pub use settings::*;
pub use templates::*;
pub use webhooks::*;

use uuid::Uuid;

use crate::common::ApiError;

/// Record ids arrive as raw path segments; anything that is not a UUID
/// cannot name a record and reads as absent.
pub(crate) fn parse_record_id(raw: &str, not_found: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(not_found.to_string()))
}
