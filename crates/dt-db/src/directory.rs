//! Team directory backed by the organization tables
//!
//! Teams, workstations and employees are owned by the surrounding product;
//! this only reads them.

use async_trait::async_trait;
use dt_core::traits::Id;
use dt_models::{Employee, Workstation};
use sqlx::{FromRow, PgPool};

use crate::repository::{RepositoryResult, TeamDirectory};

#[derive(Debug, Clone, FromRow)]
struct WorkstationRow {
    id: i64,
    name: String,
    team_id: Option<i64>,
}

#[derive(Debug, Clone, FromRow)]
struct EmployeeRow {
    id: i64,
    name: String,
    team_id: Option<i64>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.id,
            name: row.name,
            team_id: row.team_id,
        }
    }
}

/// PostgreSQL team directory
pub struct PgTeamDirectory {
    pool: PgPool,
}

impl PgTeamDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamDirectory for PgTeamDirectory {
    async fn teams_managed_by(&self, manager_id: Id) -> RepositoryResult<Vec<Id>> {
        let teams = sqlx::query_scalar::<_, i64>(
            "SELECT team_id FROM team_managers WHERE manager_id = $1 ORDER BY team_id ASC",
        )
        .bind(manager_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(teams)
    }

    async fn workstation(&self, id: Id) -> RepositoryResult<Option<Workstation>> {
        let row = sqlx::query_as::<_, WorkstationRow>(
            "SELECT id, name, team_id FROM workstations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Workstation {
            id: r.id,
            name: r.name,
            team_id: r.team_id,
        }))
    }

    async fn employee(&self, id: Id) -> RepositoryResult<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, name, team_id FROM employees WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Employee::from))
    }

    async fn employees_at_workstation(&self, workstation_id: Id) -> RepositoryResult<Vec<Employee>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT e.id, e.name, e.team_id
            FROM employees e
            INNER JOIN employee_workstations ew ON ew.employee_id = e.id
            WHERE ew.workstation_id = $1
            ORDER BY e.name ASC, e.id ASC
            "#,
        )
        .bind(workstation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Employee::from).collect())
    }
}
