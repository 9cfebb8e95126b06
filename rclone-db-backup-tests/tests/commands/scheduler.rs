//! Tests for the run queue and daemon wiring

use rclone_db_backup::managers::scheduler::{run_daemon, run_queue, spawn_worker, RunTrigger};
use rclone_db_backup::utils::cron::CronSchedule;
use std::sync::Arc;
use test_utils::{ConfigBuilder, MockExecutor, MockResponse, TestContext};

#[tokio::test]
async fn test_daemon_runs_immediately_at_startup() {
    let ctx = TestContext::new();
    let schedule = CronSchedule::parse("0 6 * * *", Some("UTC")).unwrap();

    let completed = run_daemon(Arc::new(ctx.pipeline()), schedule, async {}).await;

    assert_eq!(completed, 1);
    assert_eq!(ctx.executor().call_count("mysqldump"), 1);
}

#[tokio::test]
async fn test_failed_cycle_does_not_stop_worker() {
    let executor = MockExecutor::new()
        .expect("mysqldump", MockResponse::fail(1, "server has gone away"))
        .expect("mysqldump", MockResponse::ok());
    let ctx = TestContext::with_executor(ConfigBuilder::new(), executor);
    let (queue, receiver) = run_queue();
    let worker = spawn_worker(Arc::new(ctx.pipeline()), receiver);

    assert!(queue.enqueue(RunTrigger::Startup));
    // Wait for the first cycle to be picked up before queueing the next one
    while ctx.executor().call_count("mysqldump") == 0 {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    while !queue.enqueue(RunTrigger::Startup) {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    drop(queue);

    assert_eq!(worker.await.unwrap(), 2);
    assert_eq!(ctx.executor().call_count("mysqldump"), 2);
    assert_eq!(ctx.executor().call_count("rclone copy"), 1);
}
