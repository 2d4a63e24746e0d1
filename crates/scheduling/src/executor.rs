//! C9: the background task executor. Periodically claims pending tasks
//! (C8) and runs each one through C5-C7, writing its terminal state back.
//! An interval loop around a fallible, `catch_unwind`-guarded body, without
//! a generic `Collector` trait's machinery — that exists to support many
//! independently-configured collector *kinds* sharing a restart/backoff
//! policy, which a single fixed job (drain the task queue) doesn't need.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use database::{DirectionCache, ProgramRepository, TaskStore};
use futures::FutureExt;
use model::{ScheduleResponse, Task};
use routing::RoutingProvider;

use crate::{CachedDirectionLookup, DefaultTimings};

/// `PROCESSOR_INTERVAL`/`PROCESSOR_BATCH_SIZE`, read once at startup.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    pub interval: Duration,
    pub batch_size: i64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
            batch_size: 10,
        }
    }
}

impl ExecutorConfig {
    pub fn from_env() -> Self {
        let interval_ms: u64 = std::env::var("PROCESSOR_INTERVAL")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(5000);
        let batch_size: i64 = std::env::var("PROCESSOR_BATCH_SIZE")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(10);
        Self {
            interval: Duration::from_millis(interval_ms),
            batch_size,
        }
    }
}

/// Everything a claimed task needs to run, shared (cheaply cloneable) across
/// every tick and every concurrently-processed task in a batch.
#[derive(Clone)]
pub struct Executor {
    tasks: TaskStore,
    directions: DirectionCache,
    provider: Arc<dyn RoutingProvider>,
    programs: ProgramRepository,
    defaults: DefaultTimings,
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(
        tasks: TaskStore,
        directions: DirectionCache,
        provider: Arc<dyn RoutingProvider>,
        programs: ProgramRepository,
        defaults: DefaultTimings,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            tasks,
            directions,
            provider,
            programs,
            defaults,
            config,
        }
    }

    /// Runs forever: sleep, claim a batch, process it concurrently, repeat.
    /// A panic or error while processing one task is caught, logged, and
    /// attributed to that task alone — the loop itself never dies.
    pub async fn run_forever(self) -> ! {
        loop {
            tokio::time::sleep(self.config.interval).await;

            let batch = match self.tasks.claim_batch(self.config.batch_size).await {
                Ok(batch) => batch,
                Err(why) => {
                    log::error!("failed to claim task batch: {why}");
                    continue;
                }
            };

            if batch.is_empty() {
                continue;
            }

            log::debug!("claimed {} task(s)", batch.len());
            let handles: Vec<_> = batch
                .into_iter()
                .map(|task| {
                    let executor = self.clone();
                    tokio::spawn(async move { executor.process(task).await })
                })
                .collect();

            for handle in handles {
                if let Err(why) = handle.await {
                    log::error!("task processing future panicked: {why}");
                }
            }
        }
    }

    /// Runs one task to completion, writing COMPLETED/FAILED back
    /// regardless of how the scheduling attempt ends.
    async fn process(&self, task: Task) {
        let outcome = AssertUnwindSafe(self.schedule(&task)).catch_unwind().await;

        let result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload);
                log::error!("task {} panicked: {message}", task.id);
                Err(message)
            }
        };

        let write_result = match result {
            Ok(response) => self.tasks.complete(&task.id, response).await,
            Err(message) => self.tasks.fail(&task.id, message).await,
        };

        if let Err(why) = write_result {
            log::error!("failed to record terminal state for task {}: {why}", task.id);
        }
    }

    async fn schedule(&self, task: &Task) -> Result<ScheduleResponse, String> {
        let directions = CachedDirectionLookup {
            cache: &self.directions,
            provider: self.provider.as_ref(),
        };
        match crate::run(&task.request, &directions, &self.programs, &self.defaults).await {
            Ok(shuttles) => Ok(ScheduleResponse::success(shuttles)),
            Err(model::SchedulerError::NoSchedule(message)) => {
                Ok(ScheduleResponse::no_schedule(message))
            }
            Err(why) => Err(why.to_string()),
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked with a non-string payload".to_owned()
    }
}
