//! Tests for remote retention pruning

use test_utils::{
    artifact_listing, artifact_names, listing, ConfigBuilder, MockExecutor, MockResponse,
    TestContext,
};

fn context(retain: usize, stdout: &str) -> TestContext {
    let executor = MockExecutor::new().expect("rclone lsf", MockResponse::stdout(stdout));
    TestContext::with_executor(ConfigBuilder::new().retain(retain), executor)
}

#[test]
fn test_deletes_oldest_beyond_retention() {
    let ctx = context(3, &artifact_listing("shop", 5));
    let names = artifact_names("shop", 5);

    let report = ctx.run_cycle();

    let summary = report.outcome.unwrap();
    assert_eq!(summary.listed, 5);
    assert_eq!(summary.deleted, names[..2].to_vec());
    assert_eq!(ctx.deleted_files(), names[..2].to_vec());
}

#[test]
fn test_excess_count_matches_listing_minus_retention() {
    for (listed, retain) in [(10, 8), (9, 1), (4, 0)] {
        let ctx = context(retain, &artifact_listing("db", listed));

        ctx.run_cycle();

        let deleted = ctx.deleted_files();
        assert_eq!(deleted.len(), listed - retain);
        assert!(deleted.iter().all(|name| name.starts_with("backup_")));
    }
}

#[test]
fn test_no_deletions_within_retention() {
    for retain in [5, 6, 100] {
        let ctx = context(retain, &artifact_listing("db", 5));

        let report = ctx.run_cycle();

        assert!(report.succeeded());
        assert!(!ctx.executor().was_called("rclone delete"));
    }
}

#[test]
fn test_empty_listing() {
    let ctx = context(0, "");

    let summary = ctx.run_cycle().outcome.unwrap();

    assert_eq!(summary.listed, 0);
    assert!(!ctx.executor().was_called("rclone delete"));
}

#[test]
fn test_foreign_file_among_candidates_is_never_deleted() {
    let names = artifact_names("db", 3);
    let stdout = listing(&["notes.txt", names[0].as_str(), names[1].as_str(), names[2].as_str()]);
    let ctx = context(2, &stdout);

    let summary = ctx.run_cycle().outcome.unwrap();

    assert_eq!(summary.skipped, vec!["notes.txt".to_string()]);
    assert_eq!(summary.deleted, vec![names[0].clone()]);
    assert!(!ctx.deleted_files().contains(&"notes.txt".to_string()));
}

#[test]
fn test_skipped_file_is_not_replaced_by_a_newer_one() {
    let names = artifact_names("db", 2);
    let stdout = listing(&["other_dump.sql", names[0].as_str(), names[1].as_str()]);
    let ctx = context(2, &stdout);

    let summary = ctx.run_cycle().outcome.unwrap();

    assert_eq!(summary.skipped.len(), 1);
    assert!(summary.deleted.is_empty());
    assert!(!ctx.executor().was_called("rclone delete"));
}

#[test]
fn test_single_delete_failure_does_not_stop_the_rest() {
    let names = artifact_names("db", 4);
    let executor = MockExecutor::new()
        .expect("rclone lsf", MockResponse::stdout(&artifact_listing("db", 4)))
        .expect("rclone delete", MockResponse::fail(1, "rate limited"))
        .expect("rclone delete", MockResponse::ok());
    let ctx = TestContext::with_executor(ConfigBuilder::new().retain(1), executor);

    let report = ctx.run_cycle();

    assert!(report.succeeded());
    let summary = report.outcome.unwrap();
    assert_eq!(ctx.executor().call_count("rclone delete"), 3);
    assert_eq!(summary.failed, vec![names[0].clone()]);
    assert_eq!(summary.deleted, names[1..3].to_vec());
}

#[test]
fn test_delete_targets_remote_path() {
    let ctx = {
        let executor = MockExecutor::new()
            .expect("rclone lsf", MockResponse::stdout(&artifact_listing("db", 2)));
        let builder = ConfigBuilder::new().retain(1).remote("s3", "bucket/db/");
        TestContext::with_executor(builder, executor)
    };
    let oldest = artifact_names("db", 1).remove(0);

    ctx.run_cycle();

    let delete = &ctx.executor().calls_to("rclone delete")[0];
    assert_eq!(delete.args, vec!["delete".to_string(), format!("s3:bucket/db/{}", oldest)]);
}

#[test]
fn test_listing_requests_oldest_first() {
    let ctx = context(8, "");

    ctx.run_cycle();

    let list = &ctx.executor().calls_to("rclone lsf")[0];
    assert_eq!(
        list.args,
        vec!["lsf", "gdrive:db-backups/", "--files-only", "--order-by", "modtime,ascending"]
    );
}
