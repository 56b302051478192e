//! Daily job scheduler.
//!
//! An explicit component the process entry point starts and stops; jobs are
//! plain async callables. There are no ambient global timers: dropping the
//! scheduler (or calling [`Scheduler::shutdown`]) stops every loop.

use chrono::{DateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::utils::time::now_in_timezone;

pub struct Scheduler {
    tz: Tz,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(tz: Tz) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            tz,
            shutdown,
            handles: Vec::new(),
        }
    }

    /// Runs `job` every day at local wall-clock time `at`.
    pub fn schedule_daily<F, Fut>(&mut self, name: &'static str, at: NaiveTime, job: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let tz = self.tz;
        let mut shutdown = self.shutdown.subscribe();

        self.handles.push(tokio::spawn(async move {
            loop {
                let wait = duration_until_next(now_in_timezone(&tz), at);
                tracing::info!(job = name, wait_secs = wait.as_secs(), "next run scheduled");

                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        tracing::info!(job = name, "starting scheduled run");
                        if let Err(err) = job().await {
                            tracing::error!(job = name, error = ?err, "scheduled run failed");
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!(job = name, "scheduler loop stopping");
                        break;
                    }
                }
            }
        }));
    }

    /// Stops all loops and waits for them to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

/// Time to sleep until the next local occurrence of `at`.
///
/// If `at` has already passed today it targets tomorrow. A nonexistent local
/// time (DST spring-forward gap) falls forward to the earliest valid instant.
fn duration_until_next(now: DateTime<Tz>, at: NaiveTime) -> std::time::Duration {
    let tz = now.timezone();
    let mut candidate = now.date_naive().and_time(at);
    if candidate <= now.naive_local() {
        candidate += chrono::Duration::days(1);
    }

    let target = match tz.from_local_datetime(&candidate).earliest() {
        Some(dt) => dt,
        // Gap: shift one hour forward, which is always resolvable.
        None => tz
            .from_local_datetime(&(candidate + chrono::Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| now + chrono::Duration::days(1)),
    };

    (target - now)
        .to_std()
        .unwrap_or(std::time::Duration::ZERO)
}
