//! Day preparation repository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dt_core::traits::Id;
use dt_models::DayPreparation;
use sqlx::{FromRow, PgPool};

use crate::repository::{PreparationStore, RepositoryResult};

/// Day preparation database row
#[derive(Debug, Clone, FromRow)]
pub struct DayPreparationRow {
    pub manager_id: i64,
    pub date: NaiveDate,
    pub prepared_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<DayPreparationRow> for DayPreparation {
    fn from(row: DayPreparationRow) -> Self {
        DayPreparation {
            manager_id: row.manager_id,
            date: row.date,
            prepared_at: row.prepared_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL day preparation store
pub struct PgPreparationStore {
    pool: PgPool,
}

impl PgPreparationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreparationStore for PgPreparationStore {
    async fn find(&self, manager_id: Id, date: NaiveDate) -> RepositoryResult<Option<DayPreparation>> {
        let row = sqlx::query_as::<_, DayPreparationRow>(
            r#"
            SELECT manager_id, date, prepared_at, updated_at
            FROM day_preparations
            WHERE manager_id = $1 AND date = $2
            "#,
        )
        .bind(manager_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DayPreparation::from))
    }

    async fn mark_prepared(&self, manager_id: Id, date: NaiveDate, now: DateTime<Utc>) -> RepositoryResult<DayPreparation> {
        // COALESCE keeps the first timestamp when evaluations race
        let row = sqlx::query_as::<_, DayPreparationRow>(
            r#"
            INSERT INTO day_preparations (manager_id, date, prepared_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (manager_id, date) DO UPDATE
            SET prepared_at = COALESCE(day_preparations.prepared_at, EXCLUDED.prepared_at),
                updated_at = CASE
                    WHEN day_preparations.prepared_at IS NULL THEN EXCLUDED.updated_at
                    ELSE day_preparations.updated_at
                END
            RETURNING manager_id, date, prepared_at, updated_at
            "#,
        )
        .bind(manager_id)
        .bind(date)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn clear_prepared(&self, manager_id: Id, date: NaiveDate, now: DateTime<Utc>) -> RepositoryResult<DayPreparation> {
        let row = sqlx::query_as::<_, DayPreparationRow>(
            r#"
            INSERT INTO day_preparations (manager_id, date, prepared_at, updated_at)
            VALUES ($1, $2, NULL, $3)
            ON CONFLICT (manager_id, date) DO UPDATE
            SET prepared_at = NULL, updated_at = EXCLUDED.updated_at
            RETURNING manager_id, date, prepared_at, updated_at
            "#,
        )
        .bind(manager_id)
        .bind(date)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}
