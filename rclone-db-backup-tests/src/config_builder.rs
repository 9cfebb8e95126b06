//! Fluent API for building test configurations
//!
//! Provides a builder pattern for creating job configurations with a
//! temporary staging directory.

use rclone_db_backup::config::{
    BackupJobConfig, DatabaseConfig, LogSettings, RemoteConfig, ScheduleConfig, ToolPaths,
};
use std::path::PathBuf;
use tempfile::TempDir;

/// Builder for creating test configurations
pub struct ConfigBuilder {
    temp_dir: TempDir,
    config: BackupJobConfig,
}

impl ConfigBuilder {
    /// Defaults: remote `gdrive:db-backups`, all databases, keep 8
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let config = BackupJobConfig {
            database: DatabaseConfig::default(),
            remote: RemoteConfig {
                alias: "gdrive".to_string(),
                directory: "db-backups".to_string(),
            },
            staging_dir: temp_dir.path().join("staging"),
            retain_count: 8,
            schedule: ScheduleConfig::default(),
            tools: ToolPaths::default(),
            logging: LogSettings::default(),
        };

        Self { temp_dir, config }
    }

    pub fn retain(mut self, count: usize) -> Self {
        self.config.retain_count = count;
        self
    }

    pub fn database(mut self, name: &str) -> Self {
        self.config.database.name = Some(name.to_string());
        self
    }

    pub fn credentials(mut self, user: &str, password: &str) -> Self {
        self.config.database.user = Some(user.to_string());
        self.config.database.password = Some(password.to_string());
        self
    }

    pub fn remote(mut self, alias: &str, directory: &str) -> Self {
        self.config.remote = RemoteConfig {
            alias: alias.to_string(),
            directory: directory.to_string(),
        };
        self
    }

    pub fn schedule(mut self, expression: &str, timezone: Option<&str>) -> Self {
        self.config.schedule = ScheduleConfig {
            expression: expression.to_string(),
            timezone: timezone.map(str::to_string),
        };
        self
    }

    /// Staging directory relative to the builder's temp dir
    pub fn staging_subdir(mut self, name: &str) -> Self {
        self.config.staging_dir = self.temp_dir.path().join(name);
        self
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.config.staging_dir.clone()
    }

    /// Build the config alone (the temp dir is dropped)
    pub fn build(self) -> BackupJobConfig {
        self.config
    }

    /// Build the config, keeping the temp dir alive
    pub fn persist(self) -> (BackupJobConfig, TempDir) {
        (self.config, self.temp_dir)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
