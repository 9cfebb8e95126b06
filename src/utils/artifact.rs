//! Naming of local backup artifacts

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Every artifact name starts with this; remote pruning only touches matching files
pub const ARTIFACT_PREFIX: &str = "backup_";

pub const ARTIFACT_EXTENSION: &str = ".sql.gz";

/// Identifier used when no database name is configured
pub const ALL_DATABASES_ID: &str = "all-databases";

/// A compressed dump file produced by one backup cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    file_name: String,
    local_path: PathBuf,
}

impl BackupArtifact {
    /// Name an artifact for `database` (None = all databases) created at `created_at`
    pub fn new(staging_dir: &Path, database: Option<&str>, created_at: DateTime<Utc>) -> Self {
        let file_name = format!(
            "{}{}_{}{}",
            ARTIFACT_PREFIX,
            database.unwrap_or(ALL_DATABASES_ID),
            file_safe_timestamp(created_at),
            ARTIFACT_EXTENSION
        );
        let local_path = staging_dir.join(&file_name);

        Self {
            file_name,
            local_path,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }
}

/// Whether a remote file name looks like one of our artifacts
pub fn is_artifact_name(name: &str) -> bool {
    name.starts_with(ARTIFACT_PREFIX)
}

/// ISO-8601 UTC with milliseconds, `:` and `.` replaced by `-`
pub fn file_safe_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .replace([':', '.'], "-")
}
