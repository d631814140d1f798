//! Task instance repository
//!
//! Uniqueness lives in the schema: a partial unique index allows one
//! `UNASSIGNED` row per template and day, and a unique index on
//! `(task_template_id, date, employee_id)` stops double-booking.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dt_core::traits::Id;
use dt_models::{AssignOutcome, InstanceStatus, NewTaskInstance, TaskInstance};
use sqlx::{FromRow, PgPool};

use crate::repository::{InsertOutcome, InstanceStore, RepositoryError, RepositoryResult};

/// Task instance database row
#[derive(Debug, Clone, FromRow)]
pub struct TaskInstanceRow {
    pub id: i64,
    pub task_template_id: i64,
    pub employee_id: Option<i64>,
    pub date: NaiveDate,
    pub status: String,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TaskInstanceRow> for TaskInstance {
    type Error = RepositoryError;

    fn try_from(row: TaskInstanceRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<InstanceStatus>().map_err(RepositoryError::Storage)?;
        Ok(TaskInstance {
            id: row.id,
            task_template_id: row.task_template_id,
            employee_id: row.employee_id,
            date: row.date,
            status,
            is_completed: row.is_completed,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const COLUMNS: &str = "id, task_template_id, employee_id, date, status, is_completed, \
     completed_at, created_at, updated_at";

const DOUBLE_BOOKED: &str = "employee already holds this task on that day";

/// PostgreSQL instance store
pub struct PgInstanceStore {
    pool: PgPool,
}

impl PgInstanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InstanceStore for PgInstanceStore {
    async fn find(&self, id: Id) -> RepositoryResult<Option<TaskInstance>> {
        let row = sqlx::query_as::<_, TaskInstanceRow>(&format!(
            "SELECT {} FROM task_instances WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TaskInstance::try_from).transpose()
    }

    async fn list_for_date(&self, date: NaiveDate) -> RepositoryResult<Vec<TaskInstance>> {
        let rows = sqlx::query_as::<_, TaskInstanceRow>(&format!(
            "SELECT {} FROM task_instances WHERE date = $1 ORDER BY id ASC",
            COLUMNS
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TaskInstance::try_from).collect()
    }

    async fn list_for_template(&self, template_id: Id, date: NaiveDate) -> RepositoryResult<Vec<TaskInstance>> {
        let rows = sqlx::query_as::<_, TaskInstanceRow>(&format!(
            "SELECT {} FROM task_instances WHERE task_template_id = $1 AND date = $2 ORDER BY id ASC",
            COLUMNS
        ))
        .bind(template_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TaskInstance::try_from).collect()
    }

    async fn create(&self, new: NewTaskInstance, now: DateTime<Utc>) -> RepositoryResult<TaskInstance> {
        let row = sqlx::query_as::<_, TaskInstanceRow>(&format!(
            r#"
            INSERT INTO task_instances (
                task_template_id, employee_id, date, status, is_completed, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, false, $5, $5)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(new.task_template_id)
        .bind(new.employee_id)
        .bind(new.date)
        .bind(new.status.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, DOUBLE_BOOKED))?;

        TaskInstance::try_from(row)
    }

    async fn create_unassigned_if_absent(
        &self,
        template_id: Id,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> RepositoryResult<InsertOutcome> {
        // A concurrent insert either trips the partial unique index (DO NOTHING)
        // or is already visible to NOT EXISTS; both return no row.
        let row = sqlx::query_as::<_, TaskInstanceRow>(&format!(
            r#"
            INSERT INTO task_instances (
                task_template_id, employee_id, date, status, is_completed, created_at, updated_at
            )
            SELECT $1, NULL::BIGINT, $2, 'UNASSIGNED', false, $3, $3
            WHERE NOT EXISTS (
                SELECT 1 FROM task_instances WHERE task_template_id = $1 AND date = $2
            )
            ON CONFLICT DO NOTHING
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(template_id)
        .bind(date)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(InsertOutcome::Created(TaskInstance::try_from(row)?)),
            None => Ok(InsertOutcome::Existing),
        }
    }

    async fn assign_employee(
        &self,
        instance_id: Id,
        employee_id: Id,
        now: DateTime<Utc>,
    ) -> RepositoryResult<(TaskInstance, AssignOutcome)> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TaskInstanceRow>(&format!(
            "SELECT {} FROM task_instances WHERE id = $1 FOR UPDATE",
            COLUMNS
        ))
        .bind(instance_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("task_instance {}", instance_id)))?;

        let mut instance = TaskInstance::try_from(row)?;
        let outcome = instance.assign_to(employee_id, now);
        if outcome == AssignOutcome::Unchanged {
            tx.rollback().await?;
            return Ok((instance, outcome));
        }

        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM task_instances
                WHERE task_template_id = $1 AND date = $2 AND employee_id = $3 AND id <> $4
            )
            "#,
        )
        .bind(instance.task_template_id)
        .bind(instance.date)
        .bind(employee_id)
        .bind(instance_id)
        .fetch_one(&mut *tx)
        .await?;

        if taken {
            tx.rollback().await?;
            return Err(RepositoryError::Conflict(DOUBLE_BOOKED.to_string()));
        }

        // The unique index still guards against a booking committed after the check
        sqlx::query(
            r#"
            UPDATE task_instances
            SET employee_id = $2, status = $3, is_completed = false, completed_at = NULL, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(instance_id)
        .bind(employee_id)
        .bind(instance.status.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, DOUBLE_BOOKED))?;

        tx.commit().await?;
        Ok((instance, outcome))
    }

    async fn update_completion(
        &self,
        instance_id: Id,
        completed: bool,
        now: DateTime<Utc>,
    ) -> RepositoryResult<(TaskInstance, bool)> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TaskInstanceRow>(&format!(
            "SELECT {} FROM task_instances WHERE id = $1 FOR UPDATE",
            COLUMNS
        ))
        .bind(instance_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("task_instance {}", instance_id)))?;

        let mut instance = TaskInstance::try_from(row)?;
        let changed = instance
            .set_completed(completed, now)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

        if !changed {
            tx.rollback().await?;
            return Ok((instance, false));
        }

        sqlx::query(
            r#"
            UPDATE task_instances
            SET status = $2, is_completed = $3, completed_at = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(instance_id)
        .bind(instance.status.as_str())
        .bind(instance.is_completed)
        .bind(instance.completed_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((instance, true))
    }

    async fn delete_for_template(&self, template_id: Id) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM task_instances WHERE task_template_id = $1")
            .bind(template_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
