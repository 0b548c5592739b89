pub mod email_log;

pub use email_log::*;
