// Lazy schema bootstrap
//
// Each report table is created the first time a store for it is opened.
// Creation goes through CREATE TABLE IF NOT EXISTS, so concurrent first-time
// startups against the same file cannot fail each other.

use crate::error::{DbError, Result};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Non-negative, non-null integer
    Count,
    /// Nullable text; NULL reads back as an empty string
    Text,
}

/// One persisted report field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn count(name: &'static str) -> Self {
        Self { name, kind: ColumnKind::Count }
    }

    pub const fn text(name: &'static str) -> Self {
        Self { name, kind: ColumnKind::Text }
    }

    fn definition(&self) -> String {
        match self.kind {
            ColumnKind::Count => format!("{0} INTEGER NOT NULL CHECK ({0} >= 0)", self.name),
            ColumnKind::Text => format!("{} TEXT", self.name),
        }
    }
}

/// Outcome of making sure a report table exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    Created,
    Existing,
}

pub(crate) fn create_table_sql(table: &str, columns: &[Column]) -> String {
    let mut definitions = vec!["report_id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    definitions.extend(columns.iter().map(Column::definition));

    format!("CREATE TABLE IF NOT EXISTS {} (\n    {}\n)", table, definitions.join(",\n    "))
}

pub(crate) async fn table_exists(pool: &Pool<Sqlite>, table: &str) -> Result<bool> {
    let name: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_optional(pool)
            .await?;

    Ok(name.is_some())
}

/// Create `table` with `columns` unless it is already there.
pub(crate) async fn ensure_table(
    pool: &Pool<Sqlite>,
    table: &str,
    columns: &[Column],
) -> Result<SchemaStatus> {
    let schema_error = |e: DbError| DbError::SchemaInit(format!("table {}: {}", table, e));

    if table_exists(pool, table).await.map_err(schema_error)? {
        debug!("Report table {} already exists", table);
        return Ok(SchemaStatus::Existing);
    }

    sqlx::query(&create_table_sql(table, columns))
        .execute(pool)
        .await
        .map_err(|e| schema_error(DbError::Sqlx(e)))?;

    info!("Created report table {}", table);
    Ok(SchemaStatus::Created)
}
