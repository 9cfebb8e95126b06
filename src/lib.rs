//! rclone-db-backup library
//!
//! Scheduled MySQL dumps uploaded with rclone, with remote retention pruning.

pub mod config;
pub mod managers;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, BackupJobConfig, ConfigError};
pub use managers::backup::{BackupPipeline, CycleReport, PipelineError};
pub use managers::logging::{init_console_logging, init_logging, LogGuard, LoggingConfig};
pub use managers::scheduler::{run_daemon, RunTrigger, Scheduler};
pub use utils::cron::{CronSchedule, ScheduleError};
