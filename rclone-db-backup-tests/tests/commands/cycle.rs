//! Tests for a full backup cycle: dump, upload, cleanup

use test_utils::{
    CleanupOutcome, ConfigBuilder, MockExecutor, MockResponse, PipelineError, TestContext,
};

#[test]
fn test_successful_cycle_runs_every_step_in_order() {
    let ctx = TestContext::new();

    let report = ctx.run_cycle();

    assert!(report.succeeded());
    let programs: Vec<String> = ctx
        .executor()
        .get_calls()
        .iter()
        .map(|c| format!("{} {}", c.program, c.args.first().cloned().unwrap_or_default()))
        .collect();
    assert_eq!(programs[1..], ["rclone copy", "rclone lsf"]);
    assert!(programs[0].starts_with("mysqldump"));
}

#[test]
fn test_dump_is_piped_through_gzip_into_staging() {
    let ctx = TestContext::new();

    let report = ctx.run_cycle();

    let dump = &ctx.executor().calls_to("mysqldump")[0];
    let (filter, output) = dump.piped_into.clone().expect("dump must be piped");
    assert_eq!(filter, "gzip");
    assert_eq!(output, report.artifact.local_path());
    assert!(output.starts_with(ctx.staging_dir()));
}

#[test]
fn test_upload_copies_artifact_to_remote_directory() {
    let ctx = TestContext::from_builder(ConfigBuilder::new().remote("gdrive", "backups/mysql/"));

    let report = ctx.run_cycle();

    let copy = &ctx.executor().calls_to("rclone copy")[0];
    assert_eq!(
        copy.args,
        vec![
            "copy".to_string(),
            report.artifact.local_path().display().to_string(),
            "gdrive:backups/mysql/".to_string(),
        ]
    );
}

#[test]
fn test_local_artifact_removed_after_success() {
    let ctx = TestContext::new();

    let report = ctx.run_cycle();

    assert!(report.succeeded());
    assert_eq!(report.cleanup, CleanupOutcome::Removed);
    assert!(!report.artifact.local_path().exists());
    assert!(ctx.staging_files().is_empty());
}

#[test]
fn test_dump_failure_skips_upload_and_cleans_up() {
    let executor = MockExecutor::new()
        .expect("mysqldump", MockResponse::fail(2, "Access denied"));
    let ctx = TestContext::with_executor(ConfigBuilder::new(), executor);

    let report = ctx.run_cycle();

    assert!(!report.succeeded());
    assert!(matches!(report.outcome, Err(PipelineError::DumpFailed { .. })));
    assert!(!ctx.executor().was_called("rclone"));
    // The redirect created the file; cleanup must still remove it
    assert_eq!(report.cleanup, CleanupOutcome::Removed);
    assert!(ctx.staging_files().is_empty());
}

#[test]
fn test_dump_error_carries_stderr() {
    let executor = MockExecutor::new()
        .expect("mysqldump", MockResponse::fail(2, "Access denied\n"));
    let ctx = TestContext::with_executor(ConfigBuilder::new(), executor);

    let report = ctx.run_cycle();

    let err = report.outcome.unwrap_err().to_string();
    assert!(err.contains("exit code 2"));
    assert!(err.contains("Access denied"));
}

#[test]
fn test_missing_artifact_at_cleanup_is_benign() {
    let executor = MockExecutor::new()
        .without_output_files()
        .expect("mysqldump", MockResponse::fail(127, "mysqldump: not found"));
    let ctx = TestContext::with_executor(ConfigBuilder::new(), executor);

    let report = ctx.run_cycle();

    assert_eq!(report.cleanup, CleanupOutcome::NotFound);
}

#[test]
fn test_upload_failure_skips_prune_and_cleans_up() {
    let executor = MockExecutor::new()
        .expect("rclone copy", MockResponse::fail(1, "quota exceeded"));
    let ctx = TestContext::with_executor(ConfigBuilder::new(), executor);

    let report = ctx.run_cycle();

    assert!(matches!(report.outcome, Err(PipelineError::UploadFailed { .. })));
    assert!(!ctx.executor().was_called("rclone lsf"));
    assert!(!ctx.executor().was_called("rclone delete"));
    assert!(!report.artifact.local_path().exists());
}

#[test]
fn test_listing_failure_aborts_without_deletions() {
    let executor = MockExecutor::new()
        .expect("rclone lsf", MockResponse::fail(3, "directory not found"));
    let ctx = TestContext::with_executor(ConfigBuilder::new(), executor);

    let report = ctx.run_cycle();

    assert!(matches!(report.outcome, Err(PipelineError::ListingFailed { .. })));
    assert!(!ctx.executor().was_called("rclone delete"));
    assert!(!report.artifact.local_path().exists());
}

#[test]
fn test_unnamed_database_uses_all_databases_identifier() {
    let ctx = TestContext::new();

    let report = ctx.run_cycle();

    assert!(report
        .artifact
        .file_name()
        .starts_with("backup_all-databases_"));
    assert!(report.artifact.file_name().ends_with(".sql.gz"));
    let dump = &ctx.executor().calls_to("mysqldump")[0];
    assert!(dump.args.contains(&"--all-databases".to_string()));
}

#[test]
fn test_named_database_in_artifact_and_dump() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::new()
            .database("shop")
            .credentials("bk", "pw"),
    );

    let report = ctx.run_cycle();

    assert!(report.artifact.file_name().starts_with("backup_shop_"));
    let dump = &ctx.executor().calls_to("mysqldump")[0];
    assert_eq!(dump.args[0], "--user=bk");
    assert_eq!(dump.args[1], "--password=pw");
    assert_eq!(dump.args[2], "shop");
}

#[test]
fn test_staging_directory_created_with_parents() {
    let ctx =
        TestContext::from_builder(ConfigBuilder::new().staging_subdir("deep/nested/staging"));
    assert!(!ctx.staging_dir().exists());

    let report = ctx.run_cycle();

    assert!(report.succeeded());
    assert!(ctx.staging_dir().is_dir());
}

#[test]
fn test_staging_directory_failure_aborts_before_dump() {
    let ctx = TestContext::new();
    // A regular file where the staging directory should be
    if let Some(parent) = ctx.staging_dir().parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(ctx.staging_dir(), "not a directory").unwrap();

    let report = ctx.run_cycle();

    assert!(matches!(
        report.outcome,
        Err(PipelineError::StagingDirectory { .. })
    ));
    assert!(!ctx.executor().was_called("mysqldump"));
}

#[test]
fn test_cycle_skipped_while_lock_held() {
    let ctx = TestContext::new();
    std::fs::create_dir_all(ctx.staging_dir()).unwrap();

    let mut other = rclone_db_backup::utils::locker::RunLock::open(ctx.staging_dir()).unwrap();
    let guard = other.try_acquire().unwrap();
    assert!(guard.is_some());

    let report = ctx.run_cycle();

    assert!(matches!(report.outcome, Err(PipelineError::Locked(_))));
    assert!(!ctx.executor().was_called("mysqldump"));
    assert_eq!(report.cleanup, CleanupOutcome::NotFound);

    drop(guard);
    assert!(ctx.run_cycle().succeeded());
}

#[test]
fn test_consecutive_cycles_are_independent() {
    let ctx = TestContext::new();
    let pipeline = ctx.pipeline();

    let first = pipeline.run_cycle();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = pipeline.run_cycle();

    assert!(first.succeeded() && second.succeeded());
    assert_ne!(first.artifact.file_name(), second.artifact.file_name());
    assert_eq!(ctx.executor().call_count("mysqldump"), 2);
    assert!(ctx.staging_files().is_empty());
}
