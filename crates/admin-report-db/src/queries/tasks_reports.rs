use admin_report_common::{AvailableDescription, CompletedDescription, TasksReport};

use crate::error::Result;
use crate::schema::Column;
use crate::store::{ReportRecord, ReportStore, RowReader, SqliteQuery};

pub type TasksReportStore = ReportStore<TasksReport>;

impl ReportRecord for TasksReport {
    const TABLE: &'static str = "tasks_reports";
    const COLUMNS: &'static [Column] = &[
        Column::count("completed_total"),
        Column::count("completed_on_time"),
        Column::count("completed_late"),
        Column::count("delayed_tasks"),
        Column::count("available_total"),
        Column::count("available_due_today"),
    ];

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.completed.total)
            .bind(self.completed.on_time)
            .bind(self.completed.late)
            .bind(self.delayed)
            .bind(self.available.total)
            .bind(self.available.due_today)
    }

    fn from_row(report_id: i64, row: &RowReader<'_>) -> Result<Self> {
        Ok(Self {
            report_id,
            completed: CompletedDescription {
                total: row.count("completed_total")?,
                on_time: row.count("completed_on_time")?,
                late: row.count("completed_late")?,
            },
            delayed: row.count("delayed_tasks")?,
            available: AvailableDescription {
                total: row.count("available_total")?,
                due_today: row.count("available_due_today")?,
            },
        })
    }
}
