//! Settings domain - per-user settings document

pub mod models;

pub use models::UserSettings;
