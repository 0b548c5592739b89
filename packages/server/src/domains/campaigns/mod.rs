//! Campaigns domain - owner-scoped campaign records

pub mod models;

pub use models::{Campaign, CampaignPatch, NewCampaign};
