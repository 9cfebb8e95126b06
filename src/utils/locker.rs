//! File-based locking to prevent concurrent backup cycles

use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const LOCK_FILE_NAME: &str = ".rclone-db-backup.lock";

/// Advisory lock on a file inside the staging directory
pub struct RunLock {
    lock: RwLock<File>,
    lock_path: PathBuf,
}

impl RunLock {
    /// Open (or create) the lock file in `staging_dir`
    pub fn open(staging_dir: &Path) -> io::Result<Self> {
        let lock_path = staging_dir.join(LOCK_FILE_NAME);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        Ok(Self {
            lock: RwLock::new(file),
            lock_path,
        })
    }

    /// Take the exclusive lock without blocking; `None` if another holder has it
    pub fn try_acquire(&mut self) -> io::Result<Option<RwLockWriteGuard<'_, File>>> {
        debug!("Attempting to acquire lock: {:?}", self.lock_path);

        match self.lock.try_write() {
            Ok(guard) => Ok(Some(guard)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}
