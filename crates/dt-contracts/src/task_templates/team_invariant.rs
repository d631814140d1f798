//! Team invariant guard
//!
//! When a template names both a workstation and an employee, both must belong
//! to the same team. The check always runs on the state that would be stored:
//! patch fields override, absent fields keep the persisted value.
//!
//! A missing workstation, a missing employee, or a record without a team all
//! fail the same way, so the error does not reveal which records exist.

use dt_core::error::{DtError, InvariantViolation};
use dt_core::result::DtResult;
use dt_core::traits::Id;
use dt_db::TeamDirectory;
use dt_models::{NewTaskTemplate, TaskTemplate, TemplatePatch};

pub struct TeamInvariantGuard<'a> {
    directory: &'a dyn TeamDirectory,
}

impl<'a> TeamInvariantGuard<'a> {
    pub fn new(directory: &'a dyn TeamDirectory) -> Self {
        Self { directory }
    }

    pub async fn check_create(&self, new: &NewTaskTemplate) -> DtResult<()> {
        self.check_linkage(new.workstation_id, new.assigned_to_employee_id)
            .await
    }

    pub async fn check_update(&self, current: &TaskTemplate, patch: &TemplatePatch) -> DtResult<()> {
        let (workstation_id, employee_id) = patch.merged_linkage(current);
        self.check_linkage(workstation_id, employee_id).await
    }

    /// Bulk updates may not relink templates; each one needs its own check
    pub fn check_bulk(patch: &TemplatePatch) -> Result<(), InvariantViolation> {
        if patch.touches_linkage() {
            return Err(InvariantViolation::BulkLinkageUpdate);
        }
        Ok(())
    }

    /// Effective linkage values; passes unless both are set
    pub async fn check_linkage(&self, workstation_id: Option<Id>, employee_id: Option<Id>) -> DtResult<()> {
        let (Some(workstation_id), Some(employee_id)) = (workstation_id, employee_id) else {
            return Ok(());
        };

        let workstation_team = self
            .directory
            .workstation(workstation_id)
            .await?
            .and_then(|w| w.team_id);
        let employee_team = self
            .directory
            .employee(employee_id)
            .await?
            .and_then(|e| e.team_id);

        match (workstation_team, employee_team) {
            (Some(a), Some(b)) if a == b => Ok(()),
            _ => {
                tracing::debug!(
                    workstation_id,
                    employee_id,
                    ?workstation_team,
                    ?employee_team,
                    "same-team check failed"
                );
                Err(DtError::Invariant(InvariantViolation::SameTeam))
            }
        }
    }
}
