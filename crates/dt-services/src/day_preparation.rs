//! Day preparation aggregate
//!
//! A manager's day is prepared when every recurring template due that day in
//! their teams has someone on it. The stored marker is a cache refreshed on
//! every evaluation. A template whose team cannot be looked up is left out of
//! the listing but keeps the day from counting as prepared.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use dt_core::error::DtError;
use dt_core::result::{DtResult, ResultExt};
use dt_core::traits::Id;
use dt_models::{is_due, Employee, InstanceStatus, TaskInstance, TaskTemplate};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::context::ServiceContext;
use crate::scope::{templates_in_scope, ScopedTemplates};

/// A due template nobody holds yet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedTemplate {
    pub template_id: Id,
    pub title: String,
    pub workstation_id: Option<Id>,
    /// The open instance to assign, when one exists
    pub pending_instance_id: Option<Id>,
    pub candidates: Vec<Employee>,
    pub suggested_employee_id: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparationSummary {
    pub date: NaiveDate,
    pub due_count: usize,
    pub unassigned_count: usize,
    /// Due templates skipped because their team lookup failed
    pub unresolved_count: usize,
    pub is_prepared: bool,
    pub prepared_at: Option<DateTime<Utc>>,
    pub unassigned_templates: Vec<UnassignedTemplate>,
}

#[derive(Clone)]
pub struct DayPreparationService {
    ctx: ServiceContext,
}

impl DayPreparationService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Compute readiness for `date` over `team_ids` and refresh the marker
    #[instrument(skip(self))]
    pub async fn evaluate(&self, manager_id: Id, team_ids: &[Id], date: NaiveDate) -> DtResult<PreparationSummary> {
        let ScopedTemplates { in_scope: due, unresolved } = self.due_in_scope(team_ids, date).await?;

        let mut by_template: HashMap<Id, Vec<TaskInstance>> = HashMap::new();
        for instance in self
            .ctx
            .instances
            .list_for_date(date)
            .await
            .map_err(DtError::from)
            .log_internal("evaluate_day_preparation")?
        {
            by_template.entry(instance.task_template_id).or_default().push(instance);
        }

        let mut unassigned_templates = Vec::new();
        for template in &due {
            let instances = by_template.get(&template.id).map(Vec::as_slice).unwrap_or(&[]);
            let pending = instances.iter().find(|i| i.status == InstanceStatus::Unassigned);
            let held = instances.iter().any(|i| i.status.has_assignee());

            if pending.is_none() && held {
                continue;
            }

            let candidates = self.candidates(template).await?;
            unassigned_templates.push(UnassignedTemplate {
                template_id: template.id,
                title: template.title.clone(),
                workstation_id: template.workstation_id,
                pending_instance_id: pending.map(|i| i.id),
                suggested_employee_id: candidates.first().map(|e| e.id),
                candidates,
            });
        }

        let unassigned_count = unassigned_templates.len();
        let prepared_at = self
            .refresh_marker(manager_id, date, unassigned_count + unresolved)
            .await?;

        debug!(due = due.len(), unassigned = unassigned_count, unresolved, "day preparation evaluated");

        Ok(PreparationSummary {
            date,
            due_count: due.len(),
            unassigned_count,
            unresolved_count: unresolved,
            is_prepared: prepared_at.is_some(),
            prepared_at,
            unassigned_templates,
        })
    }

    async fn due_in_scope(&self, team_ids: &[Id], date: NaiveDate) -> DtResult<ScopedTemplates> {
        let templates = self
            .ctx
            .templates
            .list_recurring()
            .await
            .map_err(DtError::from)
            .log_internal("evaluate_day_preparation")?;

        let due: Vec<TaskTemplate> = templates.into_iter().filter(|t| is_due(t, date)).collect();
        Ok(templates_in_scope(self.ctx.directory.as_ref(), due, team_ids).await)
    }

    /// Direct templates offer their employee, workstation templates everyone linked to it
    async fn candidates(&self, template: &TaskTemplate) -> DtResult<Vec<Employee>> {
        let directory = self.ctx.directory.as_ref();
        if let Some(workstation_id) = template.workstation_id {
            return Ok(directory.employees_at_workstation(workstation_id).await?);
        }
        match template.assigned_to_employee_id {
            Some(employee_id) => Ok(directory.employee(employee_id).await?.into_iter().collect()),
            None => Ok(Vec::new()),
        }
    }

    async fn refresh_marker(
        &self,
        manager_id: Id,
        date: NaiveDate,
        open_count: usize,
    ) -> DtResult<Option<DateTime<Utc>>> {
        let now = self.ctx.clock.now();
        let store = &self.ctx.preparations;

        if open_count == 0 {
            let marker = store.mark_prepared(manager_id, date, now).await?;
            if marker.prepared_at == Some(now) {
                info!(manager_id, %date, "day prepared");
            }
            return Ok(marker.prepared_at);
        }

        if let Some(marker) = store.find(manager_id, date).await? {
            if marker.is_prepared() {
                store.clear_prepared(manager_id, date, now).await?;
                info!(manager_id, %date, open_count, "day no longer prepared");
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignments::AssignmentService;
    use crate::generator::InstanceGenerator;
    use crate::test_support::*;
    use dt_models::NewTaskTemplate;

    #[tokio::test]
    async fn test_unassigned_template_lists_candidates() {
        let fx = Fixture::new().await;
        let template = fx
            .template(NewTaskTemplate::new("Clean grill", MANAGER).at_workstation(GRILL).daily())
            .await;
        InstanceGenerator::new(fx.ctx.clone()).generate(today(), None).await.unwrap();

        let summary = DayPreparationService::new(fx.ctx.clone())
            .evaluate(MANAGER, &[TEAM], today())
            .await
            .unwrap();

        assert_eq!(summary.due_count, 1);
        assert_eq!(summary.unassigned_count, 1);
        assert!(!summary.is_prepared);

        let entry = &summary.unassigned_templates[0];
        assert_eq!(entry.template_id, template.id);
        assert!(entry.pending_instance_id.is_some());
        let names: Vec<&str> = entry.candidates.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Kim", "Lee"]);
        assert_eq!(entry.suggested_employee_id, Some(KIM));
    }

    #[tokio::test]
    async fn test_template_without_instance_counts_as_unassigned() {
        let fx = Fixture::new().await;
        fx.template(NewTaskTemplate::new("Call supplier", MANAGER).assigned_to(LEE).daily())
            .await;

        let summary = DayPreparationService::new(fx.ctx.clone())
            .evaluate(MANAGER, &[TEAM], today())
            .await
            .unwrap();

        assert_eq!(summary.unassigned_count, 1);
        let entry = &summary.unassigned_templates[0];
        assert!(entry.pending_instance_id.is_none());
        assert_eq!(entry.suggested_employee_id, Some(LEE));
    }

    #[tokio::test]
    async fn test_other_teams_are_out_of_scope() {
        let fx = Fixture::new().await;
        fx.template(NewTaskTemplate::new("Polish taps", OTHER_MANAGER).at_workstation(BAR).daily())
            .await;

        let summary = DayPreparationService::new(fx.ctx.clone())
            .evaluate(MANAGER, &[TEAM], today())
            .await
            .unwrap();

        assert_eq!(summary.due_count, 0);
        assert!(summary.is_prepared);
    }

    #[tokio::test]
    async fn test_marker_follows_assignments() {
        let fx = Fixture::new().await;
        fx.template(NewTaskTemplate::new("Clean grill", MANAGER).at_workstation(GRILL).daily())
            .await;
        InstanceGenerator::new(fx.ctx.clone()).generate(today(), None).await.unwrap();
        let service = DayPreparationService::new(fx.ctx.clone());

        let before = service.evaluate(MANAGER, &[TEAM], today()).await.unwrap();
        let instance_id = before.unassigned_templates[0].pending_instance_id.unwrap();
        AssignmentService::new(fx.ctx.clone())
            .assign_instance(instance_id, KIM, &manager())
            .await
            .unwrap();

        let prepared = service.evaluate(MANAGER, &[TEAM], today()).await.unwrap();
        assert!(prepared.is_prepared);
        let first_prepared_at = prepared.prepared_at;

        // Re-evaluating keeps the original timestamp
        fx.clock.advance(chrono::Duration::minutes(5));
        let again = service.evaluate(MANAGER, &[TEAM], today()).await.unwrap();
        assert_eq!(again.prepared_at, first_prepared_at);

        // A new due template makes the day unprepared again
        fx.template(NewTaskTemplate::new("Restock fridge", MANAGER).at_workstation(GRILL).daily())
            .await;
        let regressed = service.evaluate(MANAGER, &[TEAM], today()).await.unwrap();
        assert!(!regressed.is_prepared);
        assert!(regressed.prepared_at.is_none());

        let marker = fx.ctx.preparations.find(MANAGER, today()).await.unwrap().unwrap();
        assert!(!marker.is_prepared());
    }
}
