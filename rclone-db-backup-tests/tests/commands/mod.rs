//! Backup cycle tests for rclone-db-backup
//!
//! These tests drive the pipeline against the mock executor.

mod cycle;
mod prune;
mod scheduler;
