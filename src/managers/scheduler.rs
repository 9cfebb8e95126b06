//! Scheduler - cron triggers feeding a single backup worker
//!
//! Triggers are pushed into a bounded run queue and never wait for the
//! pipeline. One worker drains the queue, so cycles run one at a time; while a
//! cycle is in flight at most one more trigger waits, and any further
//! triggers are dropped.

use crate::managers::backup::BackupPipeline;
use crate::utils::cron::CronSchedule;
use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Pending triggers beyond the one being executed
pub const RUN_QUEUE_CAPACITY: usize = 1;

/// Why a cycle was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTrigger {
    Startup,
    Scheduled(DateTime<Utc>),
}

impl fmt::Display for RunTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunTrigger::Startup => write!(f, "startup"),
            RunTrigger::Scheduled(at) => write!(f, "scheduled ({})", at.to_rfc3339()),
        }
    }
}

/// Sending side of the run queue
#[derive(Debug, Clone)]
pub struct RunQueue {
    sender: mpsc::Sender<RunTrigger>,
}

/// Create a run queue and the receiver the worker drains
pub fn run_queue() -> (RunQueue, mpsc::Receiver<RunTrigger>) {
    let (sender, receiver) = mpsc::channel(RUN_QUEUE_CAPACITY);
    (RunQueue { sender }, receiver)
}

impl RunQueue {
    /// Queue a cycle without waiting; returns false if the trigger was dropped
    pub fn enqueue(&self, trigger: RunTrigger) -> bool {
        match self.sender.try_send(trigger) {
            Ok(()) => {
                info!("*** Triggering {} backup ***", trigger);
                true
            }
            Err(TrySendError::Full(trigger)) => {
                warn!(
                    "A backup is already pending; dropping {} trigger",
                    trigger
                );
                false
            }
            Err(TrySendError::Closed(trigger)) => {
                error!("Backup worker has stopped; dropping {} trigger", trigger);
                false
            }
        }
    }
}

/// Run queued cycles one at a time until every sender is gone
///
/// Resolves to the number of cycles executed.
pub fn spawn_worker(
    pipeline: Arc<BackupPipeline>,
    mut receiver: mpsc::Receiver<RunTrigger>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut completed = 0;

        while let Some(trigger) = receiver.recv().await {
            info!("Running {} backup", trigger);

            let pipeline = pipeline.clone();
            match tokio::task::spawn_blocking(move || pipeline.run_cycle()).await {
                Ok(report) if report.succeeded() => {
                    info!("Backup {} finished successfully", report.artifact.file_name());
                }
                Ok(report) => {
                    warn!("Backup {} did not complete", report.artifact.file_name());
                }
                Err(e) => {
                    error!("Backup cycle panicked: {}", e);
                }
            }
            completed += 1;
        }

        info!("Backup worker stopped after {} cycle(s)", completed);
        completed
    })
}

pub struct Scheduler {
    schedule: CronSchedule,
    queue: RunQueue,
}

impl Scheduler {
    pub fn new(schedule: CronSchedule, queue: RunQueue) -> Self {
        Self { schedule, queue }
    }

    /// Queue the startup run, then one run per occurrence until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Scheduling backups with '{}' in {}",
            self.schedule.expression(),
            self.schedule.zone_name()
        );

        tokio::pin!(shutdown);

        info!("Running an initial backup now...");
        self.queue.enqueue(RunTrigger::Startup);

        let mut last_fired: Option<DateTime<Utc>> = None;

        loop {
            let now = Utc::now();
            // An early timer wake must not fire the same occurrence twice
            let reference = last_fired.map_or(now, |fired| fired.max(now));

            let Some(next) = self.schedule.next_after(reference) else {
                warn!("Schedule has no future occurrences; scheduler stopping");
                break;
            };
            info!("Next scheduled backup at {}", next.to_rfc3339());

            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    self.queue.enqueue(RunTrigger::Scheduled(next));
                    last_fired = Some(next);
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested; scheduler stopping");
                    break;
                }
            }
        }
    }
}

/// Arm the scheduler and worker; returns once `shutdown` resolves and the
/// in-flight cycle, if any, has finished
pub async fn run_daemon<F>(
    pipeline: Arc<BackupPipeline>,
    schedule: CronSchedule,
    shutdown: F,
) -> usize
where
    F: Future<Output = ()>,
{
    let (queue, receiver) = run_queue();
    let worker = spawn_worker(pipeline, receiver);

    Scheduler::new(schedule, queue).run(shutdown).await;

    info!("Waiting for the running backup to finish...");
    match worker.await {
        Ok(completed) => completed,
        Err(e) => {
            error!("Backup worker failed: {}", e);
            0
        }
    }
}
