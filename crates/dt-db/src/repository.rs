//! Storage traits
//!
//! Every trait here is a seam: the services depend on these, never on a
//! concrete store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dt_core::error::DtError;
use dt_core::traits::Id;
use dt_models::{
    AssignOutcome, DayPreparation, Employee, NewTaskInstance, NewTaskTemplate, TaskInstance,
    TaskTemplate, Workstation,
};

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored data that does not map onto the domain model
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl RepositoryError {
    /// Unique-constraint violations become conflicts, anything else stays a database error
    pub fn from_sqlx(err: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return RepositoryError::Conflict(conflict_message.to_string());
            }
        }
        RepositoryError::Database(err)
    }
}

impl From<RepositoryError> for DtError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => DtError::NotFound {
                entity: "record",
                id: what,
            },
            RepositoryError::Conflict(message) => DtError::Conflict { message },
            RepositoryError::Database(e) => DtError::Database(e.to_string()),
            RepositoryError::Storage(message) => DtError::Internal(message),
        }
    }
}

/// Result of an insert that only happens when no row exists yet
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Created(TaskInstance),
    /// Some instance for the template and day already existed
    Existing,
}

impl InsertOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, InsertOutcome::Created(_))
    }
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn find(&self, id: Id) -> RepositoryResult<Option<TaskTemplate>>;

    async fn list_recurring(&self) -> RepositoryResult<Vec<TaskTemplate>>;

    async fn create(&self, new: NewTaskTemplate, now: DateTime<Utc>) -> RepositoryResult<TaskTemplate>;

    /// Persist every attribute of an existing template
    async fn update(&self, template: &TaskTemplate) -> RepositoryResult<TaskTemplate>;

    /// Remove a template; false when it did not exist.
    /// Instances go through [`InstanceStore::delete_for_template`].
    async fn delete(&self, id: Id) -> RepositoryResult<bool>;
}

#[async_trait]
pub trait InstanceStore: Send + Sync {
    async fn find(&self, id: Id) -> RepositoryResult<Option<TaskInstance>>;

    async fn list_for_date(&self, date: NaiveDate) -> RepositoryResult<Vec<TaskInstance>>;

    async fn list_for_template(&self, template_id: Id, date: NaiveDate) -> RepositoryResult<Vec<TaskInstance>>;

    /// Insert as given; an employee already holding the template that day is a conflict
    async fn create(&self, new: NewTaskInstance, now: DateTime<Utc>) -> RepositoryResult<TaskInstance>;

    /// Insert an `UNASSIGNED` instance unless any instance exists for the template and day.
    /// Check and insert are one atomic step.
    async fn create_unassigned_if_absent(
        &self,
        template_id: Id,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> RepositoryResult<InsertOutcome>;

    /// Give an instance to an employee.
    /// Conflict when another instance of the same template and day is already theirs;
    /// nothing is written in that case.
    async fn assign_employee(
        &self,
        instance_id: Id,
        employee_id: Id,
        now: DateTime<Utc>,
    ) -> RepositoryResult<(TaskInstance, AssignOutcome)>;

    /// Mark done or not done; conflict if the instance is unassigned at write time
    async fn update_completion(
        &self,
        instance_id: Id,
        completed: bool,
        now: DateTime<Utc>,
    ) -> RepositoryResult<(TaskInstance, bool)>;

    async fn delete_for_template(&self, template_id: Id) -> RepositoryResult<u64>;
}

#[async_trait]
pub trait PreparationStore: Send + Sync {
    async fn find(&self, manager_id: Id, date: NaiveDate) -> RepositoryResult<Option<DayPreparation>>;

    /// Set `prepared_at` to `now` unless it is already set
    async fn mark_prepared(&self, manager_id: Id, date: NaiveDate, now: DateTime<Utc>) -> RepositoryResult<DayPreparation>;

    async fn clear_prepared(&self, manager_id: Id, date: NaiveDate, now: DateTime<Utc>) -> RepositoryResult<DayPreparation>;
}

/// Read access to teams, workstations and employees, which are owned elsewhere
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn teams_managed_by(&self, manager_id: Id) -> RepositoryResult<Vec<Id>>;

    async fn workstation(&self, id: Id) -> RepositoryResult<Option<Workstation>>;

    async fn employee(&self, id: Id) -> RepositoryResult<Option<Employee>>;

    async fn employees_at_workstation(&self, workstation_id: Id) -> RepositoryResult<Vec<Employee>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_dt_error() {
        let err: DtError = RepositoryError::Conflict("taken".into()).into();
        assert_eq!(err.status_code(), 409);

        let err: DtError = RepositoryError::Storage("bad status".into()).into();
        assert!(err.is_internal());
        assert_eq!(err.public_message(), "internal error");

        let err: DtError = RepositoryError::Database(sqlx::Error::RowNotFound).into();
        assert_eq!(err.error_code(), "database_error");
    }
}
