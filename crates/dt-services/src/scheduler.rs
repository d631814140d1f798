//! Scheduler facade
//!
//! One entry point over the template, generation, assignment and preparation
//! services, sharing a single context.

use chrono::NaiveDate;
use dt_contracts::UserContext;
use dt_core::result::DtResult;
use dt_core::traits::Id;
use dt_models::{TaskInstance, TaskTemplate};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::assignments::AssignmentService;
use crate::context::ServiceContext;
use crate::day_preparation::{DayPreparationService, PreparationSummary};
use crate::generator::{GenerationReport, InstanceGenerator};
use crate::task_templates::TaskTemplateService;

/// What a manager sees when opening the planning view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Present only when the view was opened for today
    pub generation: Option<GenerationReport>,
    pub preparation: PreparationSummary,
}

#[derive(Clone)]
pub struct DailyTaskScheduler {
    ctx: ServiceContext,
    templates: TaskTemplateService,
    generator: InstanceGenerator,
    assignments: AssignmentService,
    preparation: DayPreparationService,
}

impl DailyTaskScheduler {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            templates: TaskTemplateService::new(ctx.clone()),
            generator: InstanceGenerator::new(ctx.clone()),
            assignments: AssignmentService::new(ctx.clone()),
            preparation: DayPreparationService::new(ctx.clone()),
            ctx,
        }
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    pub fn templates(&self) -> &TaskTemplateService {
        &self.templates
    }

    pub fn is_due(&self, template: &TaskTemplate, date: NaiveDate) -> bool {
        dt_models::is_due(template, date)
    }

    /// Generate instances for `date`, optionally limited to some teams
    pub async fn generate(&self, date: NaiveDate, scope: Option<&[Id]>) -> DtResult<GenerationReport> {
        self.generator.generate(date, scope).await
    }

    pub async fn assign_instance(
        &self,
        instance_id: Id,
        employee_id: Id,
        actor: &dyn UserContext,
    ) -> DtResult<TaskInstance> {
        self.assignments.assign_instance(instance_id, employee_id, actor).await
    }

    pub async fn set_completion(
        &self,
        instance_id: Id,
        completed: bool,
        actor: &dyn UserContext,
    ) -> DtResult<TaskInstance> {
        self.assignments.set_completion(instance_id, completed, actor).await
    }

    pub async fn evaluate_day_preparation(
        &self,
        manager_id: Id,
        team_ids: &[Id],
        date: NaiveDate,
    ) -> DtResult<PreparationSummary> {
        self.preparation.evaluate(manager_id, team_ids, date).await
    }

    /// Open the planning view for `date`
    ///
    /// Today's view first fills in missing instances for the manager's teams,
    /// so a day is never judged on instances the cron run has not created yet.
    #[instrument(skip(self))]
    pub async fn open_dashboard(&self, manager_id: Id, date: NaiveDate) -> DtResult<Dashboard> {
        let teams = self.ctx.directory.teams_managed_by(manager_id).await?;
        debug!(teams = teams.len(), "opening dashboard");

        let generation = if date == self.ctx.clock.today() {
            Some(self.generator.generate(date, Some(teams.as_slice())).await?)
        } else {
            None
        };

        let preparation = self.preparation.evaluate(manager_id, &teams, date).await?;
        Ok(Dashboard { generation, preparation })
    }
}
