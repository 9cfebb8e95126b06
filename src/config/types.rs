use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Optional TOML configuration file; every key may also come from the environment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_name: Option<String>,

    pub rclone_remote: Option<String>,
    pub remote_dir: Option<String>,
    pub local_backup_dir: Option<PathBuf>,

    pub keep_backups: Option<usize>,
    pub cron_schedule: Option<String>,
    pub cron_timezone: Option<String>,

    pub mysqldump_bin: Option<String>,
    pub gzip_bin: Option<String>,
    pub rclone_bin: Option<String>,

    pub log_level: Option<String>,
    pub log_directory: Option<PathBuf>,
    pub log_max_files: Option<u32>,
}

/// Fully resolved job configuration, immutable for the process lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupJobConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    /// Local directory artifacts are written to before upload
    pub staging_dir: PathBuf,
    /// Number of most recent remote files kept after pruning
    pub retain_count: usize,
    pub schedule: ScheduleConfig,
    pub tools: ToolPaths,
    pub logging: LogSettings,
}

/// Dump credentials and target
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub user: Option<String>,
    pub password: Option<String>,
    /// None dumps all databases
    pub name: Option<String>,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("name", &self.name)
            .finish()
    }
}

/// rclone destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Name of the rclone remote
    pub alias: String,
    /// Directory inside the remote holding the artifacts
    pub directory: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub expression: String,
    /// IANA name; None means the host's local time zone
    pub timezone: Option<String>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            expression: default_cron_schedule(),
            timezone: None,
        }
    }
}

/// Programs invoked for each pipeline step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub mysqldump: String,
    pub gzip: String,
    pub rclone: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            mysqldump: "mysqldump".to_string(),
            gzip: "gzip".to_string(),
            rclone: "rclone".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    /// When set, logs are also written to a daily rolling file here
    pub directory: Option<PathBuf>,
    pub max_files: u32,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            max_files: default_log_max_files(),
        }
    }
}

pub fn default_keep_backups() -> usize {
    8
}

/// Once a day at 06:00
pub fn default_cron_schedule() -> String {
    "0 6 * * *".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_log_max_files() -> u32 {
    10
}
