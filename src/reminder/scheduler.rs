use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::ReminderJob;
use crate::clock::Clock;

/// Decides when a periodic job fires next.
pub trait Scheduler: Send + Sync {
    /// The first firing strictly after `now`.
    fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc>;
}

/// Fires once per day at a fixed UTC wall-clock time.
#[derive(Debug, Clone, Copy)]
pub struct DailyAt {
    time: NaiveTime,
}

impl DailyAt {
    pub fn new(time: NaiveTime) -> Self {
        Self { time }
    }
}

impl Scheduler for DailyAt {
    fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.time).and_utc();
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }
}

/// Runs `job` forever on `scheduler`'s timetable.
///
/// A failed run is logged and the loop carries on to the next slot.
pub fn spawn_reminder_loop(
    job: Arc<ReminderJob>,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = clock.now();
            let next = scheduler.next_run_after(now);
            log::debug!("Next reminder run at {}", next);

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            match job.run().await {
                Ok(report) => log::info!(
                    "Reminder run finished: {} due, {} sent, {} failed",
                    report.matched,
                    report.sent,
                    report.failed
                ),
                Err(e) => log::error!("Reminder run failed: {}", e),
            }
        }
    })
}
