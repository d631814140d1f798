//! Assignment state machine
//!
//! `UNASSIGNED -> ASSIGNED -> DONE`, `DONE -> ASSIGNED`, `ASSIGNED -> ASSIGNED`.
//! Authorization is relational: managers act on their team's instances,
//! employees may toggle completion on their own.

use chrono::NaiveDate;
use dt_contracts::UserContext;
use dt_core::error::DtError;
use dt_core::result::{DtResult, ResultExt};
use dt_core::traits::Id;
use dt_db::InsertOutcome;
use dt_models::{is_due, AssignOutcome, NewTaskInstance, TaskInstance, TaskTemplate};
use dt_notifications::TaskEvent;
use tracing::{debug, info, instrument};

use crate::context::ServiceContext;
use crate::scope::{manages, scope_team};

#[derive(Clone)]
pub struct AssignmentService {
    ctx: ServiceContext,
}

impl AssignmentService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    async fn load(&self, instance_id: Id) -> DtResult<(TaskInstance, TaskTemplate)> {
        let instance = self
            .ctx
            .instances
            .find(instance_id)
            .await?
            .ok_or_else(|| DtError::not_found("task_instance", instance_id))?;

        // An instance without its template is treated as gone
        let template = self
            .ctx
            .templates
            .find(instance.task_template_id)
            .await?
            .ok_or_else(|| DtError::not_found("task_instance", instance_id))?;

        Ok((instance, template))
    }

    /// Give an instance to an employee of the instance's team
    ///
    /// Re-assigning to the current holder succeeds without writing. Moving a
    /// done instance to someone else clears its completion.
    #[instrument(skip(self, actor), fields(actor_id = actor.id()))]
    pub async fn assign_instance(
        &self,
        instance_id: Id,
        employee_id: Id,
        actor: &dyn UserContext,
    ) -> DtResult<TaskInstance> {
        let (instance, template) = self.load(instance_id).await?;
        let directory = self.ctx.directory.as_ref();

        let team_id = scope_team(directory, &template).await?;
        if !manages(directory, actor.id(), team_id).await? {
            return Err(DtError::forbidden("only a manager of this team can assign its tasks"));
        }

        // Same answer for unknown employees and employees of other teams
        let employee = directory.employee(employee_id).await?;
        if !employee.is_some_and(|e| team_id.is_some_and(|team| e.belongs_to(team))) {
            return Err(DtError::not_found("employee", employee_id));
        }

        let now = self.ctx.clock.now();
        let (updated, outcome) = self
            .ctx
            .instances
            .assign_employee(instance.id, employee_id, now)
            .await
            .map_err(DtError::from)
            .log_internal("assign_instance")?;

        match outcome {
            AssignOutcome::Unchanged => {
                debug!(instance_id, employee_id, "instance already held by employee");
            }
            AssignOutcome::Assigned { previous_employee_id, cleared_completion } => {
                info!(
                    instance_id,
                    employee_id,
                    ?previous_employee_id,
                    cleared_completion,
                    "instance assigned"
                );
                self.ctx.notifications.dispatch(&TaskEvent::instance_assigned(
                    &updated,
                    team_id,
                    Some(actor.id()),
                    now,
                ));
            }
        }

        Ok(updated)
    }

    /// Mark an instance done or not done
    #[instrument(skip(self, actor), fields(actor_id = actor.id()))]
    pub async fn set_completion(
        &self,
        instance_id: Id,
        completed: bool,
        actor: &dyn UserContext,
    ) -> DtResult<TaskInstance> {
        let (instance, template) = self.load(instance_id).await?;
        let directory = self.ctx.directory.as_ref();

        let team_id = scope_team(directory, &template).await?;
        let is_holder = instance.employee_id == Some(actor.id());
        if !is_holder && !manages(directory, actor.id(), team_id).await? {
            return Err(DtError::forbidden("only the assignee or a team manager can update this task"));
        }

        if completed && instance.is_unassigned() {
            return Err(DtError::invalid("status", "an unassigned task cannot be completed"));
        }

        let now = self.ctx.clock.now();
        let (updated, changed) = self
            .ctx
            .instances
            .update_completion(instance.id, completed, now)
            .await
            .map_err(DtError::from)
            .log_internal("set_completion")?;

        if changed {
            info!(instance_id, completed, "instance completion changed");
            self.ctx.notifications.dispatch(&TaskEvent::instance_updated(
                &updated,
                team_id,
                Some(actor.id()),
                now,
            ));
        }

        Ok(updated)
    }

    /// Materialize a freshly created template for `date`
    ///
    /// - with an assigned employee: an `ASSIGNED` instance, when due that day
    ///   or when the template is one-off
    /// - one-off without an employee: an `UNASSIGNED` instance
    /// - otherwise nothing; the generator takes over
    #[instrument(skip(self, template), fields(template_id = template.id))]
    pub async fn create_assigned_instance(
        &self,
        template: &TaskTemplate,
        date: NaiveDate,
    ) -> DtResult<Option<TaskInstance>> {
        let now = self.ctx.clock.now();
        let wanted_today = !template.is_recurring || is_due(template, date);

        let created = match template.assigned_to_employee_id {
            Some(employee_id) if wanted_today => {
                self.ctx
                    .instances
                    .create(NewTaskInstance::assigned(template.id, employee_id, date), now)
                    .await?
            }
            None if !template.is_recurring => {
                match self
                    .ctx
                    .instances
                    .create_unassigned_if_absent(template.id, date, now)
                    .await?
                {
                    InsertOutcome::Created(instance) => instance,
                    InsertOutcome::Existing => return Ok(None),
                }
            }
            _ => return Ok(None),
        };

        debug!(instance_id = created.id, status = %created.status, "initial instance created");

        if template.notify_employee && created.employee_id.is_some() {
            let team_id = scope_team(self.ctx.directory.as_ref(), template).await?;
            self.ctx
                .notifications
                .dispatch(&TaskEvent::instance_assigned(&created, team_id, None, now));
        }

        Ok(Some(created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use dt_contracts::Actor;
    use dt_core::clock::Clock;
    use dt_models::{InstanceStatus, NewTaskTemplate};
    use dt_notifications::TaskEventKind;

    async fn open_instance(fx: &Fixture) -> TaskInstance {
        let template = fx
            .template(NewTaskTemplate::new("Clean grill", MANAGER).at_workstation(GRILL).daily())
            .await;
        match fx
            .ctx
            .instances
            .create_unassigned_if_absent(template.id, today(), fx.clock.now())
            .await
            .unwrap()
        {
            InsertOutcome::Created(instance) => instance,
            InsertOutcome::Existing => panic!("fresh store already had an instance"),
        }
    }

    #[tokio::test]
    async fn test_manager_assigns_team_member() {
        let fx = Fixture::new().await;
        let instance = open_instance(&fx).await;
        let service = AssignmentService::new(fx.ctx.clone());

        let assigned = service.assign_instance(instance.id, KIM, &manager()).await.unwrap();
        assert_eq!(assigned.status, InstanceStatus::Assigned);
        assert_eq!(assigned.employee_id, Some(KIM));

        let events = fx.notifier.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TaskEventKind::InstanceAssigned);
        assert_eq!(events[0].actor_id, Some(MANAGER));
    }

    #[tokio::test]
    async fn test_same_employee_is_a_silent_no_op() {
        let fx = Fixture::new().await;
        let instance = open_instance(&fx).await;
        let service = AssignmentService::new(fx.ctx.clone());

        service.assign_instance(instance.id, KIM, &manager()).await.unwrap();
        fx.notifier.clear();
        let again = service.assign_instance(instance.id, KIM, &manager()).await.unwrap();

        assert_eq!(again.employee_id, Some(KIM));
        assert!(fx.notifier.events().is_empty());
    }

    #[tokio::test]
    async fn test_other_manager_is_forbidden() {
        let fx = Fixture::new().await;
        let instance = open_instance(&fx).await;
        let service = AssignmentService::new(fx.ctx.clone());

        let err = service
            .assign_instance(instance.id, KIM, &Actor::new(OTHER_MANAGER))
            .await
            .unwrap_err();
        assert!(matches!(err, DtError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_employee_outside_team_is_not_found() {
        let fx = Fixture::new().await;
        let instance = open_instance(&fx).await;
        let service = AssignmentService::new(fx.ctx.clone());

        let err = service.assign_instance(instance.id, SAM, &manager()).await.unwrap_err();
        assert!(matches!(err, DtError::NotFound { entity: "employee", .. }));

        let err = service.assign_instance(instance.id, 999, &manager()).await.unwrap_err();
        assert!(matches!(err, DtError::NotFound { entity: "employee", .. }));
    }

    #[tokio::test]
    async fn test_missing_instance_is_not_found() {
        let fx = Fixture::new().await;
        let service = AssignmentService::new(fx.ctx.clone());

        let err = service.assign_instance(404, KIM, &manager()).await.unwrap_err();
        assert!(matches!(err, DtError::NotFound { entity: "task_instance", .. }));
    }

    #[tokio::test]
    async fn test_holder_completes_and_reopens() {
        let fx = Fixture::new().await;
        let instance = open_instance(&fx).await;
        let service = AssignmentService::new(fx.ctx.clone());
        service.assign_instance(instance.id, KIM, &manager()).await.unwrap();

        let done = service.set_completion(instance.id, true, &Actor::new(KIM)).await.unwrap();
        assert_eq!(done.status, InstanceStatus::Done);
        assert!(done.is_completed);
        assert_eq!(done.completed_at, Some(fx.clock.now()));

        let reopened = service.set_completion(instance.id, false, &Actor::new(KIM)).await.unwrap();
        assert_eq!(reopened.status, InstanceStatus::Assigned);
        assert!(reopened.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_bystander_cannot_complete() {
        let fx = Fixture::new().await;
        let instance = open_instance(&fx).await;
        let service = AssignmentService::new(fx.ctx.clone());
        service.assign_instance(instance.id, KIM, &manager()).await.unwrap();

        let err = service.set_completion(instance.id, true, &Actor::new(LEE)).await.unwrap_err();
        assert!(matches!(err, DtError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_unassigned_cannot_be_completed() {
        let fx = Fixture::new().await;
        let instance = open_instance(&fx).await;
        let service = AssignmentService::new(fx.ctx.clone());

        let err = service.set_completion(instance.id, true, &manager()).await.unwrap_err();
        match err {
            DtError::Validation(errors) => assert!(errors.has_error("status")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_reassigning_done_instance_clears_completion() {
        let fx = Fixture::new().await;
        let instance = open_instance(&fx).await;
        let service = AssignmentService::new(fx.ctx.clone());
        service.assign_instance(instance.id, KIM, &manager()).await.unwrap();
        service.set_completion(instance.id, true, &Actor::new(KIM)).await.unwrap();

        let moved = service.assign_instance(instance.id, LEE, &manager()).await.unwrap();
        assert_eq!(moved.employee_id, Some(LEE));
        assert_eq!(moved.status, InstanceStatus::Assigned);
        assert!(!moved.is_completed);
        assert!(moved.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_initial_instance_for_direct_template() {
        let fx = Fixture::new().await;
        let template = fx
            .template(NewTaskTemplate::new("Call supplier", MANAGER).assigned_to(KIM).notify_employee(true))
            .await;
        let service = AssignmentService::new(fx.ctx.clone());

        let created = service.create_assigned_instance(&template, today()).await.unwrap().unwrap();
        assert_eq!(created.status, InstanceStatus::Assigned);
        assert_eq!(created.employee_id, Some(KIM));
        assert_eq!(fx.notifier.events().len(), 1);
    }

    #[tokio::test]
    async fn test_no_initial_instance_when_not_due() {
        let fx = Fixture::new().await;
        let template = fx
            .template(
                NewTaskTemplate::new("Deep clean", MANAGER)
                    .assigned_to(KIM)
                    .weekly(dt_models::WeekdaySet::from_days([1]).unwrap()),
            )
            .await;
        let service = AssignmentService::new(fx.ctx.clone());

        assert!(service.create_assigned_instance(&template, today()).await.unwrap().is_none());
        assert!(fx.ctx.instances.list_for_date(today()).await.unwrap().is_empty());
    }
}
