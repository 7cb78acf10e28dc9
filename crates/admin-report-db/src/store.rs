use std::marker::PhantomData;

use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info};

use crate::connection::Database;
use crate::error::{DbError, Result};
use crate::schema::{self, Column, SchemaStatus};

pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Mapping between a report type and its table.
///
/// `bind_columns` must bind exactly one value per entry of `COLUMNS`, in the
/// same order. `report_id` is never part of `COLUMNS`; the store assigns it.
pub trait ReportRecord: Sized + Send + Sync + Unpin + 'static {
    const TABLE: &'static str;
    const COLUMNS: &'static [Column];

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;

    fn from_row(report_id: i64, row: &RowReader<'_>) -> Result<Self>;
}

/// Typed column access over a stored report row. Anything that does not fit
/// the report shape becomes [`DbError::Decode`].
pub struct RowReader<'r> {
    row: &'r SqliteRow,
    table: &'static str,
}

impl<'r> RowReader<'r> {
    pub fn new(row: &'r SqliteRow, table: &'static str) -> Self {
        Self { row, table }
    }

    pub fn count(&self, column: &str) -> Result<u32> {
        let value: Option<i64> =
            self.row.try_get(column).map_err(|e| self.decode_error(column, e))?;
        let value = value.ok_or_else(|| {
            DbError::Decode(format!("{}.{}: NULL is not a valid count", self.table, column))
        })?;

        u32::try_from(value).map_err(|_| {
            DbError::Decode(format!("{}.{}: {} is not a valid count", self.table, column, value))
        })
    }

    pub fn text(&self, column: &str) -> Result<String> {
        let value: Option<String> =
            self.row.try_get(column).map_err(|e| self.decode_error(column, e))?;

        Ok(value.unwrap_or_default())
    }

    fn decode_error(&self, column: &str, error: sqlx::Error) -> DbError {
        DbError::Decode(format!("{}.{}: {}", self.table, column, error))
    }
}

/// Add-by-value, get-by-id persistence for one kind of report.
///
/// Opening the store makes sure its table exists. Stores are cheap to clone
/// and safe to share between request handlers; the pool does the locking.
pub struct ReportStore<R: ReportRecord> {
    pool: Pool<Sqlite>,
    status: SchemaStatus,
    insert_sql: String,
    get_sql: String,
    _record: PhantomData<fn() -> R>,
}

impl<R: ReportRecord> Clone for ReportStore<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            status: self.status,
            insert_sql: self.insert_sql.clone(),
            get_sql: self.get_sql.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: ReportRecord> ReportStore<R> {
    pub async fn open(db: &Database) -> Result<Self> {
        let pool = db.pool()?.clone();
        let status = schema::ensure_table(&pool, R::TABLE, R::COLUMNS).await?;

        let names: Vec<&str> = R::COLUMNS.iter().map(|column| column.name).collect();
        let placeholders = vec!["?"; names.len()].join(", ");

        let insert_sql =
            format!("INSERT INTO {} ({}) VALUES ({})", R::TABLE, names.join(", "), placeholders);
        let get_sql = format!(
            "SELECT report_id, {} FROM {} WHERE report_id = ?",
            names.join(", "),
            R::TABLE
        );

        debug!("Opened report store for {} ({:?})", R::TABLE, status);

        Ok(Self { pool, status, insert_sql, get_sql, _record: PhantomData })
    }

    /// What opening the store found: a fresh table or an existing one.
    pub fn schema_status(&self) -> SchemaStatus {
        self.status
    }

    /// Re-check the table. Safe to call any number of times.
    pub async fn ensure_schema(&self) -> Result<SchemaStatus> {
        schema::ensure_table(&self.pool, R::TABLE, R::COLUMNS).await
    }

    /// Persist `report` and return the id the database assigned to it.
    /// The `report_id` already carried by `report` is ignored.
    pub async fn add(&self, report: &R) -> Result<i64> {
        let result = report.bind_columns(sqlx::query(&self.insert_sql)).execute(&self.pool).await?;

        if result.rows_affected() != 1 {
            return Err(DbError::UnexpectedRowCount(result.rows_affected()));
        }

        let report_id = result.last_insert_rowid();
        info!("Stored report {} in {}", report_id, R::TABLE);

        Ok(report_id)
    }

    pub async fn get(&self, report_id: i64) -> Result<R> {
        let row = sqlx::query(&self.get_sql)
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                DbError::NotFound(format!("report {} in {}", report_id, R::TABLE))
            })?;

        let stored_id: i64 = row
            .try_get("report_id")
            .map_err(|e| DbError::Decode(format!("{}.report_id: {}", R::TABLE, e)))?;

        R::from_row(stored_id, &RowReader::new(&row, R::TABLE))
    }

    /// Release the shared pool. Calling it again has no effect.
    pub async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            info!("Closed report store for {}", R::TABLE);
        }
    }
}
