pub mod artifact;
pub mod command;
pub mod cron;
pub mod locker;
pub mod mysqldump;
pub mod rclone;

// Trait-based abstraction for testability
pub mod executor;

// Re-export commonly used types and traits (used by test crate)
pub use command::{CommandLine, CommandResult, ExitInfo};
pub use executor::{CommandExecutor, RealExecutor};
