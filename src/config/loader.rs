use super::expand_tilde;
use super::types::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Dotenv file read from the working directory
pub const DOTENV_FILE: &str = ".env";

/// Environment variable names
pub mod keys {
    pub const DB_USER: &str = "DB_USER";
    pub const DB_PASS: &str = "DB_PASS";
    pub const DB_NAME: &str = "DB_NAME";
    pub const RCLONE_REMOTE: &str = "RCLONE_REMOTE";
    pub const GDRIVE_BACKUP_DIR: &str = "GDRIVE_BACKUP_DIR";
    /// Alias of GDRIVE_BACKUP_DIR
    pub const REMOTE_BACKUP_DIR: &str = "REMOTE_BACKUP_DIR";
    pub const LOCAL_BACKUP_DIR: &str = "LOCAL_BACKUP_DIR";
    pub const KEEP_BACKUPS: &str = "KEEP_BACKUPS";
    pub const CRON_SCHEDULE: &str = "CRON_SCHEDULE";
    pub const CRON_TIMEZONE: &str = "CRON_TIMEZONE";
    pub const MYSQLDUMP_BIN: &str = "MYSQLDUMP_BIN";
    pub const GZIP_BIN: &str = "GZIP_BIN";
    pub const RCLONE_BIN: &str = "RCLONE_BIN";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const LOG_DIRECTORY: &str = "LOG_DIRECTORY";
    pub const LOG_MAX_FILES: &str = "LOG_MAX_FILES";
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to read env file {path:?}: {source}")]
    DotenvError {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Missing required settings: {}", .0.join(", "))]
    MissingRequired(Vec<&'static str>),

    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load configuration from an optional TOML file, `./.env` and the process environment
///
/// Process environment variables win over `.env` entries. A missing `.env`
/// is not an error.
pub fn load_config(file: Option<&Path>) -> Result<BackupJobConfig> {
    let dotenv = read_dotenv(Path::new(DOTENV_FILE))?;
    load_config_with(file, |key| {
        std::env::var(key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| dotenv.get(key).cloned())
    })
}

/// Read `KEY=value` pairs from a dotenv file without touching the process environment
pub fn read_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    let to_error = |source: dotenvy::Error| ConfigError::DotenvError {
        path: path.to_path_buf(),
        source,
    };

    match dotenvy::from_path_iter(path) {
        Ok(entries) => entries.map(|entry| entry.map_err(to_error)).collect(),
        Err(e) if e.not_found() => Ok(HashMap::new()),
        Err(e) => Err(to_error(e)),
    }
}

/// Load configuration with an explicit environment lookup
pub fn load_config_with<F>(file: Option<&Path>, env: F) -> Result<BackupJobConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let file_config = match file {
        Some(path) => read_config_file(path)?,
        None => FileConfig::default(),
    };
    resolve_config(file_config, env)
}

/// Parse a TOML configuration file
pub fn read_config_file(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&contents)?)
}

/// Merge file values with the environment (environment wins) and validate
pub fn resolve_config<F>(file: FileConfig, env: F) -> Result<BackupJobConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let file = without_empty_values(file);

    // Empty values count as unset
    let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let rclone_remote = lookup(keys::RCLONE_REMOTE).or(file.rclone_remote);
    let remote_dir = lookup(keys::GDRIVE_BACKUP_DIR)
        .or_else(|| lookup(keys::REMOTE_BACKUP_DIR))
        .or(file.remote_dir);
    let local_backup_dir = lookup(keys::LOCAL_BACKUP_DIR)
        .map(PathBuf::from)
        .or(file.local_backup_dir);

    let mut missing = Vec::new();
    if rclone_remote.is_none() {
        missing.push(keys::RCLONE_REMOTE);
    }
    if remote_dir.is_none() {
        missing.push(keys::GDRIVE_BACKUP_DIR);
    }
    if local_backup_dir.is_none() {
        missing.push(keys::LOCAL_BACKUP_DIR);
    }

    let (Some(alias), Some(directory), Some(staging_dir)) =
        (rclone_remote, remote_dir, local_backup_dir)
    else {
        return Err(ConfigError::MissingRequired(missing));
    };

    let retain_count = match lookup(keys::KEEP_BACKUPS) {
        Some(raw) => parse_number(keys::KEEP_BACKUPS, &raw)?,
        None => file.keep_backups.unwrap_or_else(default_keep_backups),
    };

    let log_max_files = match lookup(keys::LOG_MAX_FILES) {
        Some(raw) => parse_number(keys::LOG_MAX_FILES, &raw)?,
        None => file.log_max_files.unwrap_or_else(default_log_max_files),
    };

    let defaults = ToolPaths::default();

    Ok(BackupJobConfig {
        database: DatabaseConfig {
            user: lookup(keys::DB_USER).or(file.db_user),
            password: lookup(keys::DB_PASS).or(file.db_password),
            name: lookup(keys::DB_NAME).or(file.db_name),
        },
        remote: RemoteConfig { alias, directory },
        staging_dir: expand_tilde(&staging_dir),
        retain_count,
        schedule: ScheduleConfig {
            expression: lookup(keys::CRON_SCHEDULE)
                .or(file.cron_schedule)
                .unwrap_or_else(default_cron_schedule),
            timezone: lookup(keys::CRON_TIMEZONE).or(file.cron_timezone),
        },
        tools: ToolPaths {
            mysqldump: lookup(keys::MYSQLDUMP_BIN)
                .or(file.mysqldump_bin)
                .unwrap_or(defaults.mysqldump),
            gzip: lookup(keys::GZIP_BIN)
                .or(file.gzip_bin)
                .unwrap_or(defaults.gzip),
            rclone: lookup(keys::RCLONE_BIN)
                .or(file.rclone_bin)
                .unwrap_or(defaults.rclone),
        },
        logging: LogSettings {
            level: lookup(keys::LOG_LEVEL)
                .or(file.log_level)
                .unwrap_or_else(default_log_level),
            directory: lookup(keys::LOG_DIRECTORY)
                .map(PathBuf::from)
                .or(file.log_directory)
                .map(|dir| expand_tilde(&dir)),
            max_files: log_max_files,
        },
    })
}

/// Treat blank strings and paths in the file like absent keys
fn without_empty_values(file: FileConfig) -> FileConfig {
    fn text(value: Option<String>) -> Option<String> {
        value.filter(|v| !v.trim().is_empty())
    }
    fn path(value: Option<PathBuf>) -> Option<PathBuf> {
        value.filter(|p| !p.as_os_str().to_string_lossy().trim().is_empty())
    }

    FileConfig {
        db_user: text(file.db_user),
        db_password: text(file.db_password),
        db_name: text(file.db_name),
        rclone_remote: text(file.rclone_remote),
        remote_dir: text(file.remote_dir),
        local_backup_dir: path(file.local_backup_dir),
        cron_schedule: text(file.cron_schedule),
        cron_timezone: text(file.cron_timezone),
        mysqldump_bin: text(file.mysqldump_bin),
        gzip_bin: text(file.gzip_bin),
        rclone_bin: text(file.rclone_bin),
        log_level: text(file.log_level),
        log_directory: path(file.log_directory),
        ..file
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
