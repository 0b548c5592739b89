//! Email servers domain - owner-scoped SMTP/IMAP accounts used for sending
//! and reply polling. At most one per owner is the default.

pub mod models;

pub use models::{EmailServer, EmailServerPatch, NewEmailServer, REQUIRED_FIELDS};
