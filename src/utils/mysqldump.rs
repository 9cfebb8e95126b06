//! mysqldump invocation

use super::command::CommandLine;
use crate::config::DatabaseConfig;

/// Options for a consistent snapshot of a live InnoDB server without table locks
pub const SNAPSHOT_OPTIONS: [&str; 3] = ["--single-transaction", "--quick", "--lock-tables=false"];

/// Build the dump command for `database`
pub fn dump_command(program: &str, database: &DatabaseConfig) -> CommandLine {
    let mut cmd = CommandLine::new(program);

    if let Some(ref user) = database.user {
        cmd = cmd.arg(format!("--user={}", user));
    }
    if let Some(ref password) = database.password {
        cmd = cmd.secret_arg("--password=", password);
    }

    cmd = match database.name {
        Some(ref name) => cmd.arg(name.as_str()),
        None => cmd.arg("--all-databases"),
    };

    cmd.args(SNAPSHOT_OPTIONS)
}

/// Compression filter the dump is piped through
pub fn compress_command(program: &str) -> CommandLine {
    CommandLine::new(program)
}
