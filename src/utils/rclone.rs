//! rclone invocations for the remote backup directory

use super::command::CommandLine;
use crate::config::RemoteConfig;
use std::path::Path;

/// The remote directory artifacts are synced to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    program: String,
    /// `alias:directory/`
    destination: String,
}

impl RemoteTarget {
    pub fn new(program: &str, remote: &RemoteConfig) -> Self {
        let directory = remote.directory.trim_end_matches('/');
        Self {
            program: program.to_string(),
            destination: format!("{}:{}/", remote.alias, directory),
        }
    }

    /// `alias:directory/`
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Copy a local file into the remote directory
    pub fn copy_command(&self, local: &Path) -> CommandLine {
        CommandLine::new(&self.program)
            .arg("copy")
            .arg(local.display().to_string())
            .arg(&self.destination)
    }

    /// List file names only, oldest first
    pub fn list_command(&self) -> CommandLine {
        CommandLine::new(&self.program)
            .arg("lsf")
            .arg(&self.destination)
            .args(["--files-only", "--order-by", "modtime,ascending"])
    }

    /// Delete one file from the remote directory
    pub fn delete_command(&self, file_name: &str) -> CommandLine {
        CommandLine::new(&self.program)
            .arg("delete")
            .arg(format!("{}{}", self.destination, file_name))
    }
}

/// Split `rclone lsf` output into file names, dropping blank lines
pub fn parse_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
