pub mod habits_reports;
pub mod tasks_reports;

pub use habits_reports::HabitsReportStore;
pub use tasks_reports::TasksReportStore;
