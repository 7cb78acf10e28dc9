pub mod connection;
pub mod error;
pub mod queries;
pub mod schema;
pub mod store;

pub use connection::{Database, DatabaseConfig};
pub use error::{DbError, Result};
pub use queries::{HabitsReportStore, TasksReportStore};
pub use schema::{Column, ColumnKind, SchemaStatus};
pub use store::{ReportRecord, ReportStore, RowReader, SqliteQuery};
