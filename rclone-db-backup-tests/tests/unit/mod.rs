//! Unit tests for rclone-db-backup building blocks

mod commands;
