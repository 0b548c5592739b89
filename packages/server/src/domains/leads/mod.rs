//! Leads domain - read-only listing; writes are not implemented yet

pub mod models;

pub use models::Lead;
