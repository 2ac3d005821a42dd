//! Postgres-backed guestbook repository.
//!
//! Entries live in a single `guestbook_entries` table. The database assigns
//! identifiers through its `BIGSERIAL` sequence; `save` writes the row and
//! reads the id back in one `INSERT ... RETURNING` statement.
//!
//! ## Error Mapping
//!
//! | SQLx Error | RepositoryError |
//! |------------|-----------------|
//! | Database (any code) | `Storage` (message includes the SQLSTATE) |
//! | PoolClosed / PoolTimedOut / Io / Tls | `Storage` |
//! | Column decode failure | `Storage` |
//!
//! Rows that decode but break the entry rules surface as `Domain`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{info, instrument};

use guestbook_core::EntryId;
use guestbook_entries::{GuestbookEntry, GuestbookEntryRecord};

use super::{GuestbookRepository, RepositoryError, ensure_unpersisted};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS guestbook_entries (
    id    BIGSERIAL PRIMARY KEY,
    name  TEXT        NOT NULL,
    email TEXT        NOT NULL,
    text  TEXT        NOT NULL,
    date  TIMESTAMPTZ NOT NULL
)
"#;

/// Postgres-backed guestbook repository.
///
/// `Send + Sync`; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct PostgresGuestbookRepository {
    pool: Arc<PgPool>,
}

impl PostgresGuestbookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `guestbook_entries` table if it does not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(CREATE_TABLE)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl GuestbookRepository for PostgresGuestbookRepository {
    #[instrument(skip(self, entry), err)]
    async fn save(&self, entry: GuestbookEntry) -> Result<GuestbookEntry, RepositoryError> {
        ensure_unpersisted(&entry)?;

        let row = sqlx::query(
            r#"
            INSERT INTO guestbook_entries (name, email, text, date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(entry.name())
        .bind(entry.email())
        .bind(entry.text())
        .bind(entry.date())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save", e))?;

        let raw: i64 = row
            .try_get("id")
            .map_err(|e| map_sqlx_error("save", e))?;
        let id = EntryId::new(raw)?;
        let stored = entry.assign_id(id)?;

        info!(entry_id = %id, "guestbook entry saved");
        Ok(stored)
    }

    async fn find_by_id(&self, id: EntryId) -> Result<Option<GuestbookEntry>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, text, date
            FROM guestbook_entries
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_id", e))?;

        match row {
            Some(row) => Ok(Some(record_from_row(&row)?.into_entry()?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<GuestbookEntry>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, text, date
            FROM guestbook_entries
            ORDER BY date ASC, id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_all", e))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            entries.push(record_from_row(row)?.into_entry()?);
        }
        Ok(entries)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: EntryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM guestbook_entries WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }

        info!("guestbook entry deleted");
        Ok(())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM guestbook_entries")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;

        let total: i64 = row
            .try_get("total")
            .map_err(|e| map_sqlx_error("count", e))?;
        u64::try_from(total)
            .map_err(|_| RepositoryError::Storage(format!("negative row count {total}")))
    }
}

fn record_from_row(row: &PgRow) -> Result<GuestbookEntryRecord, RepositoryError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_row", e);
    Ok(GuestbookEntryRecord {
        id: row.try_get::<i64, _>("id").map_err(decode)?,
        name: row.try_get::<String, _>("name").map_err(decode)?,
        email: row.try_get::<String, _>("email").map_err(decode)?,
        text: row.try_get::<String, _>("text").map_err(decode)?,
        date: row.try_get::<DateTime<Utc>, _>("date").map_err(decode)?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
            RepositoryError::Storage(format!(
                "database error in {operation} (code {code}): {}",
                db_err.message()
            ))
        }
        other => RepositoryError::Storage(format!("{operation}: {other}")),
    }
}
