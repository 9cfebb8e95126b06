//! Configuration module for rclone-db-backup
//!
//! Settings come from environment variables, optionally layered over a TOML
//! file. The result is a single immutable [`BackupJobConfig`] built once at
//! startup and handed to the scheduler and pipeline.
//!
//! ## Precedence
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`)
//! 3. `.env` in the working directory
//! 4. Environment variables
//!
//! ## Example Usage
//!
//! ```no_run
//! use rclone_db_backup::config;
//!
//! let config = config::load_config(None)?;
//! println!("Keeping {} backups in {}:{}", config.retain_count,
//!     config.remote.alias, config.remote.directory);
//! # Ok::<(), config::ConfigError>(())
//! ```

mod loader;
mod types;

pub use loader::{
    keys, load_config, load_config_with, read_config_file, read_dotenv, resolve_config, ConfigError,
    Result, DOTENV_FILE,
};
pub use types::*;

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> std::path::PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
