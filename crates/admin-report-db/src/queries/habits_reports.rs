use admin_report_common::{HabitDescription, HabitRange, HabitsReport};

use crate::error::Result;
use crate::schema::Column;
use crate::store::{ReportRecord, ReportStore, RowReader, SqliteQuery};

pub type HabitsReportStore = ReportStore<HabitsReport>;

impl ReportRecord for HabitsReport {
    const TABLE: &'static str = "habits_reports";
    const COLUMNS: &'static [Column] = &[
        Column::count("red"),
        Column::count("orange"),
        Column::count("yellow"),
        Column::count("green"),
        Column::count("blue"),
        Column::text("worst_name"),
        Column::text("worst_title"),
        Column::text("best_name"),
        Column::text("best_title"),
    ];

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.range_count.red)
            .bind(self.range_count.orange)
            .bind(self.range_count.yellow)
            .bind(self.range_count.green)
            .bind(self.range_count.blue)
            .bind(self.worst.user.as_str())
            .bind(self.worst.title.as_str())
            .bind(self.best.user.as_str())
            .bind(self.best.title.as_str())
    }

    fn from_row(report_id: i64, row: &RowReader<'_>) -> Result<Self> {
        Ok(Self {
            report_id,
            range_count: HabitRange {
                red: row.count("red")?,
                orange: row.count("orange")?,
                yellow: row.count("yellow")?,
                green: row.count("green")?,
                blue: row.count("blue")?,
            },
            worst: HabitDescription {
                user: row.text("worst_name")?,
                title: row.text("worst_title")?,
            },
            best: HabitDescription { user: row.text("best_name")?, title: row.text("best_title")? },
        })
    }
}
