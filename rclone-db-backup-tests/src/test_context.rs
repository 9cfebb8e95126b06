//! Test context and harness for pipeline testing
//!
//! Owns the temporary staging area, the configuration and a mock executor,
//! and builds pipelines wired to that executor.

use crate::config_builder::ConfigBuilder;
use rclone_db_backup::config::BackupJobConfig;
use rclone_db_backup::managers::backup::{BackupPipeline, CycleReport};
use rclone_db_backup::utils::executor::mock::MockExecutor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Test context that manages test resources and provides common utilities
pub struct TestContext {
    /// Keeps the staging directory alive
    _temp_dir: TempDir,
    config: Arc<BackupJobConfig>,
    executor: MockExecutor,
}

impl TestContext {
    /// Default configuration, executor succeeding for every command
    pub fn new() -> Self {
        Self::from_builder(ConfigBuilder::new())
    }

    pub fn from_builder(builder: ConfigBuilder) -> Self {
        Self::with_executor(builder, MockExecutor::new())
    }

    pub fn with_executor(builder: ConfigBuilder, executor: MockExecutor) -> Self {
        let (config, temp_dir) = builder.persist();
        Self {
            _temp_dir: temp_dir,
            config: Arc::new(config),
            executor,
        }
    }

    pub fn config(&self) -> &BackupJobConfig {
        &self.config
    }

    pub fn executor(&self) -> &MockExecutor {
        &self.executor
    }

    pub fn staging_dir(&self) -> &Path {
        &self.config.staging_dir
    }

    /// A pipeline sharing this context's executor
    pub fn pipeline(&self) -> BackupPipeline {
        BackupPipeline::new(self.config.clone(), Box::new(self.executor.clone()))
    }

    pub fn run_cycle(&self) -> CycleReport {
        self.pipeline().run_cycle()
    }

    /// Files in the staging directory, ignoring the lock file
    pub fn staging_files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.staging_dir()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();
        names
    }

    /// Remote files passed to `rclone delete`, in call order
    pub fn deleted_files(&self) -> Vec<String> {
        self.executor
            .calls_to("rclone delete")
            .iter()
            .filter_map(|call| call.args.get(1))
            .map(|target| {
                target
                    .rsplit_once('/')
                    .map(|(_, name)| name.to_string())
                    .unwrap_or_else(|| target.clone())
            })
            .collect()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
