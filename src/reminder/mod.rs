//! Daily email reminders for tasks due tomorrow.

pub mod notifier;
pub mod scheduler;

use chrono::{Duration, NaiveDate};
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::AppError;
use crate::store::{DueTask, TaskStore};

pub use notifier::{LogNotifier, Notifier, NotifyError, Reminder, SmtpNotifier};
pub use scheduler::{spawn_reminder_loop, DailyAt, Scheduler};

/// Outcome of one reminder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderReport {
    pub matched: usize,
    pub sent: usize,
    pub failed: usize,
}

pub struct ReminderJob {
    store: Arc<dyn TaskStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl ReminderJob {
    pub fn new(store: Arc<dyn TaskStore>, notifier: Arc<dyn Notifier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    /// The calendar day reminders are sent for: tomorrow, relative to now.
    pub fn due_day(&self) -> NaiveDate {
        self.clock.today() + Duration::days(1)
    }

    /// Notifies the owner of every incomplete task due tomorrow.
    ///
    /// A failed notification is logged and counted; it does not stop the rest.
    pub async fn run(&self) -> Result<ReminderReport, AppError> {
        log::info!("Running daily email reminder job...");
        let day = self.due_day();
        let due = self.store.find_incomplete_due(day, day).await?;

        if due.is_empty() {
            log::info!("No tasks due tomorrow.");
            return Ok(ReminderReport::default());
        }

        let mut report = ReminderReport {
            matched: due.len(),
            ..Default::default()
        };
        for item in &due {
            if item.owner_email.trim().is_empty() {
                continue;
            }
            match self.notifier.notify(&compose(item)).await {
                Ok(()) => {
                    report.sent += 1;
                    log::info!("Email sent to {} for task {}", item.owner_email, item.task.id);
                }
                Err(e) => {
                    report.failed += 1;
                    log::error!("Failed to send email to {}: {}", item.owner_email, e);
                }
            }
        }
        Ok(report)
    }
}

fn compose(item: &DueTask) -> Reminder {
    let task = &item.task;
    Reminder {
        to: item.owner_email.clone(),
        subject: format!("Reminder: Task \"{}\" is due tomorrow!", task.title),
        body: format!(
            "Hi {},\n\nDon't forget: task \"{}\" is due tomorrow ({}).\nPriority: {}\n\nGood luck!",
            task.author_username,
            task.title,
            task.due_date.format("%a %b %d %Y"),
            task.priority
        ),
    }
}
