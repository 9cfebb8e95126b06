//! Command lines built for the external tools

use rclone_db_backup::config::{DatabaseConfig, RemoteConfig};
use rclone_db_backup::utils::mysqldump::dump_command;
use rclone_db_backup::utils::rclone::RemoteTarget;
use std::path::Path;

#[test]
fn test_dump_targets_all_databases_when_unnamed() {
    let cmd = dump_command("mysqldump", &DatabaseConfig::default());
    let args = cmd.arg_values();
    assert!(args.contains(&"--all-databases"));
    assert!(args.contains(&"--single-transaction"));
    assert!(args.contains(&"--quick"));
    assert!(args.contains(&"--lock-tables=false"));
}

#[test]
fn test_dump_credentials_only_when_configured() {
    let cmd = dump_command(
        "mysqldump",
        &DatabaseConfig {
            user: Some("root".into()),
            password: None,
            name: Some("shop".into()),
        },
    );
    let args = cmd.arg_values();
    assert_eq!(args[0], "--user=root");
    assert_eq!(args[1], "shop");
    assert!(!args.iter().any(|a| a.starts_with("--password")));
    assert!(!args.contains(&"--all-databases"));
}

#[test]
fn test_logged_dump_command_hides_password() {
    let cmd = dump_command(
        "mysqldump",
        &DatabaseConfig {
            user: Some("root".into()),
            password: Some("topsecret".into()),
            name: None,
        },
    );
    assert!(cmd.arg_values().contains(&"--password=topsecret"));
    assert!(cmd.to_string().contains("--password=***"));
    assert!(!cmd.to_string().contains("topsecret"));
}

#[test]
fn test_remote_commands_share_destination() {
    let target = RemoteTarget::new(
        "rclone",
        &RemoteConfig {
            alias: "gdrive".into(),
            directory: "backups".into(),
        },
    );

    let copy = target.copy_command(Path::new("/tmp/backup_a.sql.gz"));
    let list = target.list_command();
    let delete = target.delete_command("backup_a.sql.gz");

    assert_eq!(copy.arg_values()[2], "gdrive:backups/");
    assert_eq!(list.arg_values()[1], "gdrive:backups/");
    assert_eq!(delete.arg_values()[1], "gdrive:backups/backup_a.sql.gz");
}
