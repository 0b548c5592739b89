pub mod email_server;

pub use email_server::*;
