//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod event_runner;
pub mod postgres_store;
pub mod test_dependencies;
pub mod traits;

pub use deps::{ServerDeps, SupabaseTokenVerifier};
pub use event_runner::{EventRunnerConfig, LoggingEventRunner, TokioEventRunner};
pub use postgres_store::PostgresRecordStore;
pub use test_dependencies::TestDependencies;
pub use traits::*;
