//! Test utilities for rclone-db-backup
//!
//! Shared builders, fixtures and a pipeline harness driven by the mock
//! executor, so backup cycles can be exercised without mysqldump or rclone.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_utils::{ConfigBuilder, TestContext, MockResponse};
//!
//! #[test]
//! fn my_test() {
//!     let ctx = TestContext::from_builder(ConfigBuilder::new().retain(3));
//!     let report = ctx.run_cycle();
//!     assert!(report.succeeded());
//! }
//! ```

pub mod config_builder;
pub mod fixtures;
pub mod test_context;

// Re-export commonly used items
pub use config_builder::ConfigBuilder;
pub use fixtures::*;
pub use test_context::TestContext;

// Re-export types from the main crate for convenience
pub use rclone_db_backup::config::{BackupJobConfig, DatabaseConfig, RemoteConfig};
pub use rclone_db_backup::managers::backup::{
    BackupPipeline, CleanupOutcome, CycleReport, PipelineError, PruneSummary,
};

// Re-export mock implementations from the main crate
pub use rclone_db_backup::utils::executor::mock::{CommandCall, MockExecutor, MockResponse};
pub use rclone_db_backup::utils::executor::CommandExecutor;
