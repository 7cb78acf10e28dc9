// Tasks aggregation
//
// Reduces the full task collection into a TasksReport. Completion, delay and
// availability are independent counters over the same pass.

use chrono::{DateTime, Datelike, Local, TimeZone};
use tracing::debug;

use crate::types::{AvailableDescription, CompletedDescription, Task, TasksReport};

/// Build a report from every task currently known to the provider, using the
/// local wall clock as "now".
pub fn summarize(tasks: &[Task]) -> TasksReport {
    summarize_at(tasks, &Local::now())
}

/// Build a report relative to `now`.
///
/// "Due today" compares the day of the year only, evaluated in the time zone of
/// `now`, so a due date exactly one year away also counts as due today.
pub fn summarize_at<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> TasksReport {
    let now_seconds = now.timestamp();
    let today = now.ordinal();
    let zone = now.timezone();

    let mut completed = CompletedDescription::default();
    let mut delayed = 0;
    let mut available = AvailableDescription::default();

    for task in tasks {
        match task.completed_date {
            Some(completed_date) => {
                completed.total += 1;
                if completed_date <= task.due_date {
                    completed.on_time += 1;
                } else {
                    completed.late += 1;
                }
            }
            None => {
                if task.due_date < now_seconds {
                    delayed += 1;
                }

                available.total += 1;
                let due_day =
                    zone.timestamp_opt(task.due_date, 0).single().map(|due| due.ordinal());
                if due_day == Some(today) {
                    available.due_today += 1;
                }
            }
        }
    }

    debug!(
        "Summarized {} tasks: {} completed, {} delayed, {} available",
        tasks.len(),
        completed.total,
        delayed,
        available.total
    );

    TasksReport { report_id: 0, completed, delayed, available }
}
