// Outreach API - Core
//
// Backend for the outreach dashboard: owner-scoped campaigns, templates,
// leads and senders behind a bearer-token authorizer, plus the email event
// webhook that feeds the background workers.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
