// Business domains. Each owns its models and the SQL that goes with them.

pub mod auth;
pub mod campaigns;
pub mod email_events;
pub mod email_servers;
pub mod leads;
pub mod senders;
pub mod settings;
pub mod templates;
