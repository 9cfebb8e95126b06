//! Backup pipeline - one dump, upload and prune cycle

use crate::config::BackupJobConfig;
use crate::utils::artifact::{is_artifact_name, BackupArtifact};
use crate::utils::command::ExitInfo;
use crate::utils::executor::CommandExecutor;
use crate::utils::locker::RunLock;
use crate::utils::mysqldump;
use crate::utils::rclone::{parse_listing, RemoteTarget};
use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Failure that aborts the current cycle
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to create staging directory {path:?}: {source}")]
    StagingDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to open run lock {path:?}: {source}")]
    LockFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Another backup cycle holds the lock {0:?}")]
    Locked(PathBuf),

    #[error("Database dump failed ({exit}): {stderr}")]
    DumpFailed { exit: ExitInfo, stderr: String },

    #[error("Upload to {destination} failed ({exit}): {stderr}")]
    UploadFailed {
        destination: String,
        exit: ExitInfo,
        stderr: String,
    },

    #[error("Listing {destination} failed ({exit}): {stderr}")]
    ListingFailed {
        destination: String,
        exit: ExitInfo,
        stderr: String,
    },
}

/// Files chosen for removal from one remote listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrunePlan {
    /// Oldest artifacts beyond the retention window
    pub delete: Vec<String>,
    /// Candidates left alone because they are not artifacts
    pub skipped: Vec<String>,
}

/// Pick deletions from a listing ordered oldest first
///
/// The `listed - retain` oldest entries are candidates. Candidates that do not
/// carry the artifact prefix are skipped, and nothing else is picked in their
/// place.
pub fn plan_prune(listing: &[String], retain: usize) -> PrunePlan {
    let excess = listing.len().saturating_sub(retain);
    let (delete, skipped): (Vec<String>, Vec<String>) = listing[..excess]
        .iter()
        .cloned()
        .partition(|name| is_artifact_name(name));

    PrunePlan { delete, skipped }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneSummary {
    pub listed: usize,
    pub deleted: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

/// What happened to the local artifact at the end of a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Removed,
    /// Nothing to remove; the dump never produced the file
    NotFound,
    Failed(String),
}

/// Result of one cycle
#[derive(Debug)]
pub struct CycleReport {
    pub artifact: BackupArtifact,
    pub outcome: Result<PruneSummary, PipelineError>,
    pub cleanup: CleanupOutcome,
    pub duration: Duration,
}

impl CycleReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub struct BackupPipeline {
    config: Arc<BackupJobConfig>,
    executor: Box<dyn CommandExecutor>,
    remote: RemoteTarget,
}

impl BackupPipeline {
    pub fn new(config: Arc<BackupJobConfig>, executor: Box<dyn CommandExecutor>) -> Self {
        let remote = RemoteTarget::new(&config.tools.rclone, &config.remote);
        Self {
            config,
            executor,
            remote,
        }
    }

    pub fn config(&self) -> &BackupJobConfig {
        &self.config
    }

    /// Run one full cycle; failures are logged and reported, never raised
    pub fn run_cycle(&self) -> CycleReport {
        self.run_cycle_at(Utc::now())
    }

    /// Run one cycle whose artifact is stamped with `started_at`
    pub fn run_cycle_at(&self, started_at: DateTime<Utc>) -> CycleReport {
        let start_time = Instant::now();
        info!("=== Starting backup cycle ===");

        let artifact = BackupArtifact::new(
            &self.config.staging_dir,
            self.config.database.name.as_deref(),
            started_at,
        );

        let outcome = self.execute(&artifact);
        match outcome {
            Ok(_) => {}
            Err(PipelineError::Locked(ref path)) => {
                warn!("Skipping backup cycle: lock {:?} is held by another run", path);
            }
            Err(ref e) => {
                error!("### BACKUP CYCLE FAILED ### {}", e);
            }
        }

        let cleanup = remove_local_artifact(artifact.local_path());

        let duration = start_time.elapsed();
        info!(
            "=== Backup cycle completed in {:.2}s ===",
            duration.as_secs_f64()
        );

        CycleReport {
            artifact,
            outcome,
            cleanup,
            duration,
        }
    }

    fn execute(&self, artifact: &BackupArtifact) -> Result<PruneSummary, PipelineError> {
        let staging_dir = &self.config.staging_dir;

        fs::create_dir_all(staging_dir).map_err(|source| PipelineError::StagingDirectory {
            path: staging_dir.clone(),
            source,
        })?;
        info!("Staging directory ready: {}", staging_dir.display());

        let mut lock = RunLock::open(staging_dir).map_err(|source| PipelineError::LockFile {
            path: staging_dir.clone(),
            source,
        })?;
        let lock_path = lock.path().to_path_buf();
        let _guard = lock
            .try_acquire()
            .map_err(|source| PipelineError::LockFile {
                path: lock_path.clone(),
                source,
            })?
            .ok_or_else(|| PipelineError::Locked(lock_path.clone()))?;

        self.dump(artifact)?;
        self.upload(artifact)?;
        self.prune()
    }

    fn dump(&self, artifact: &BackupArtifact) -> Result<(), PipelineError> {
        let dump = mysqldump::dump_command(&self.config.tools.mysqldump, &self.config.database);
        let compress = mysqldump::compress_command(&self.config.tools.gzip);

        let result = self
            .executor
            .run_piped(&dump, &compress, artifact.local_path());
        if !result.succeeded {
            return Err(PipelineError::DumpFailed {
                exit: result.exit,
                stderr: result.stderr.trim().to_string(),
            });
        }

        info!(
            "Backup created and compressed: {}",
            artifact.local_path().display()
        );
        Ok(())
    }

    fn upload(&self, artifact: &BackupArtifact) -> Result<(), PipelineError> {
        // Success is judged by exit status alone; the remote copy is not verified
        let result = self
            .executor
            .run(&self.remote.copy_command(artifact.local_path()));
        if !result.succeeded {
            return Err(PipelineError::UploadFailed {
                destination: self.remote.destination().to_string(),
                exit: result.exit,
                stderr: result.stderr.trim().to_string(),
            });
        }

        info!(
            "Uploaded {} to {}",
            artifact.file_name(),
            self.remote.destination()
        );
        Ok(())
    }

    fn prune(&self) -> Result<PruneSummary, PipelineError> {
        let retain = self.config.retain_count;
        info!("Cleaning up old backups (keeping {})...", retain);

        let result = self.executor.run(&self.remote.list_command());
        if !result.succeeded {
            return Err(PipelineError::ListingFailed {
                destination: self.remote.destination().to_string(),
                exit: result.exit,
                stderr: result.stderr.trim().to_string(),
            });
        }

        let listing = parse_listing(&result.stdout);
        let plan = plan_prune(&listing, retain);

        let mut summary = PruneSummary {
            listed: listing.len(),
            skipped: plan.skipped,
            ..Default::default()
        };

        for name in &summary.skipped {
            warn!("Skipping deletion of unexpected remote file: {}", name);
        }

        if plan.delete.is_empty() {
            info!("There are no old backups to delete");
            return Ok(summary);
        }

        info!("Deleting {} old backup(s)", plan.delete.len());

        // Each deletion stands alone; one failure does not stop the rest
        for name in plan.delete {
            let result = self.executor.run(&self.remote.delete_command(&name));
            if result.succeeded {
                summary.deleted.push(name);
            } else {
                warn!("Failed to delete remote backup {}: {}", name, result.exit);
                summary.failed.push(name);
            }
        }

        info!(
            "Remote cleanup complete: {} deleted, {} failed, {} skipped",
            summary.deleted.len(),
            summary.failed.len(),
            summary.skipped.len()
        );

        Ok(summary)
    }
}

/// Remove the local artifact; a missing file is not an error
fn remove_local_artifact(path: &Path) -> CleanupOutcome {
    info!("Cleaning local file: {}", path.display());

    match fs::remove_file(path) {
        Ok(()) => {
            info!("Local file deleted");
            CleanupOutcome::Removed
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Local file not found (never created or already removed)");
            CleanupOutcome::NotFound
        }
        Err(e) => {
            error!("Failed to delete local file {}: {}", path.display(), e);
            CleanupOutcome::Failed(e.to_string())
        }
    }
}
