//! Task template repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dt_core::traits::Id;
use dt_models::{NewTaskTemplate, RecurrenceType, TaskTemplate, WeekdaySet};
use sqlx::{FromRow, PgPool};

use crate::repository::{RepositoryError, RepositoryResult, TemplateStore};

/// Task template database row
#[derive(Debug, Clone, FromRow)]
pub struct TaskTemplateRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub workstation_id: Option<i64>,
    pub assigned_to_employee_id: Option<i64>,
    pub is_recurring: bool,
    pub recurrence_type: Option<String>,
    pub recurrence_days: Vec<i16>,
    pub target_per_week: Option<i16>,
    pub notify_employee: bool,
    pub created_by_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TaskTemplateRow> for TaskTemplate {
    type Error = RepositoryError;

    fn try_from(row: TaskTemplateRow) -> Result<Self, Self::Error> {
        let recurrence_type = row
            .recurrence_type
            .as_deref()
            .map(str::parse::<RecurrenceType>)
            .transpose()
            .map_err(RepositoryError::Storage)?;

        let recurrence_days = WeekdaySet::from_days(row.recurrence_days.iter().map(|d| i64::from(*d)))
            .map_err(|e| RepositoryError::Storage(format!("task_template {}: {}", row.id, e)))?;

        let target_per_week = row
            .target_per_week
            .map(u8::try_from)
            .transpose()
            .map_err(|_| RepositoryError::Storage(format!("task_template {}: bad target_per_week", row.id)))?;

        Ok(TaskTemplate {
            id: row.id,
            title: row.title,
            description: row.description,
            workstation_id: row.workstation_id,
            assigned_to_employee_id: row.assigned_to_employee_id,
            is_recurring: row.is_recurring,
            recurrence_type,
            recurrence_days,
            target_per_week,
            notify_employee: row.notify_employee,
            created_by_id: row.created_by_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn days_column(days: WeekdaySet) -> Vec<i16> {
    days.days().into_iter().map(i16::from).collect()
}

const COLUMNS: &str = "id, title, description, workstation_id, assigned_to_employee_id, \
     is_recurring, recurrence_type, recurrence_days, target_per_week, notify_employee, \
     created_by_id, created_at, updated_at";

/// PostgreSQL template store
pub struct PgTemplateStore {
    pool: PgPool,
}

impl PgTemplateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn find(&self, id: Id) -> RepositoryResult<Option<TaskTemplate>> {
        let row = sqlx::query_as::<_, TaskTemplateRow>(&format!(
            "SELECT {} FROM task_templates WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TaskTemplate::try_from).transpose()
    }

    async fn list_recurring(&self) -> RepositoryResult<Vec<TaskTemplate>> {
        let rows = sqlx::query_as::<_, TaskTemplateRow>(&format!(
            "SELECT {} FROM task_templates WHERE is_recurring = true ORDER BY id ASC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TaskTemplate::try_from).collect()
    }

    async fn create(&self, new: NewTaskTemplate, now: DateTime<Utc>) -> RepositoryResult<TaskTemplate> {
        let row = sqlx::query_as::<_, TaskTemplateRow>(&format!(
            r#"
            INSERT INTO task_templates (
                title, description, workstation_id, assigned_to_employee_id,
                is_recurring, recurrence_type, recurrence_days, target_per_week,
                notify_employee, created_by_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.workstation_id)
        .bind(new.assigned_to_employee_id)
        .bind(new.is_recurring)
        .bind(new.recurrence_type.map(|t| t.as_str()))
        .bind(days_column(new.recurrence_days))
        .bind(new.target_per_week.map(i16::from))
        .bind(new.notify_employee)
        .bind(new.created_by_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        TaskTemplate::try_from(row)
    }

    async fn update(&self, template: &TaskTemplate) -> RepositoryResult<TaskTemplate> {
        let row = sqlx::query_as::<_, TaskTemplateRow>(&format!(
            r#"
            UPDATE task_templates SET
                title = $2,
                description = $3,
                workstation_id = $4,
                assigned_to_employee_id = $5,
                is_recurring = $6,
                recurrence_type = $7,
                recurrence_days = $8,
                target_per_week = $9,
                notify_employee = $10,
                updated_at = $11
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(template.id)
        .bind(&template.title)
        .bind(&template.description)
        .bind(template.workstation_id)
        .bind(template.assigned_to_employee_id)
        .bind(template.is_recurring)
        .bind(template.recurrence_type.map(|t| t.as_str()))
        .bind(days_column(template.recurrence_days))
        .bind(template.target_per_week.map(i16::from))
        .bind(template.notify_employee)
        .bind(template.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("task_template {}", template.id)))?;

        TaskTemplate::try_from(row)
    }

    async fn delete(&self, id: Id) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM task_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
