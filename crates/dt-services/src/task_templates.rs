//! Task template service
//!
//! Validation order for every write: contract rules, then the team invariant
//! guard, then storage. Nothing is written when any step fails.

use dt_contracts::task_templates::{
    CreateTaskTemplateContract, TeamInvariantGuard, UpdateTaskTemplateContract,
};
use dt_contracts::{Contract, UserContext};
use dt_core::error::{DtError, ValidationErrors};
use dt_core::result::{DtResult, ResultExt};
use dt_core::traits::Id;
use dt_models::{NewTaskTemplate, TaskTemplate, TemplatePatch};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::assignments::AssignmentService;
use crate::context::ServiceContext;

#[derive(Clone)]
pub struct TaskTemplateService {
    ctx: ServiceContext,
    assignments: AssignmentService,
}

impl TaskTemplateService {
    pub fn new(ctx: ServiceContext) -> Self {
        let assignments = AssignmentService::new(ctx.clone());
        Self { ctx, assignments }
    }

    fn guard(&self) -> TeamInvariantGuard<'_> {
        TeamInvariantGuard::new(self.ctx.directory.as_ref())
    }

    async fn find(&self, id: Id) -> DtResult<TaskTemplate> {
        self.ctx
            .templates
            .find(id)
            .await?
            .ok_or_else(|| DtError::not_found("task_template", id))
    }

    /// Create a template and materialize it for today where that applies
    ///
    /// The template and its initial instance stand or fall together: when the
    /// instance cannot be written the template is removed again.
    #[instrument(skip(self, new, actor), fields(title = %new.title, actor_id = actor.id()))]
    pub async fn create(&self, mut new: NewTaskTemplate, actor: &dyn UserContext) -> DtResult<TaskTemplate> {
        new.created_by_id = actor.id();

        CreateTaskTemplateContract::new().validate(&new)?;
        self.guard().check_create(&new).await?;

        let now = self.ctx.clock.now();
        let template = self
            .ctx
            .templates
            .create(new, now)
            .await
            .map_err(DtError::from)
            .log_internal("create_task_template")?;
        info!(template_id = template.id, "task template created");

        let today = self.ctx.clock.today();
        if let Err(err) = self.assignments.create_assigned_instance(&template, today).await {
            if let Err(cleanup) = self.remove(template.id).await {
                error!(template_id = template.id, error = %cleanup, "could not roll back template");
            }
            return Err::<TaskTemplate, _>(err).log_internal("create_task_template");
        }

        Ok(template)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: Id, patch: TemplatePatch) -> DtResult<TaskTemplate> {
        let current = self.find(id).await?;

        let contract = UpdateTaskTemplateContract::new(&current);
        contract.validate(&patch)?;
        self.guard().check_update(&current, &patch).await?;

        let mut updated = contract.merged(&patch);
        updated.updated_at = self.ctx.clock.now();

        let saved = self
            .ctx
            .templates
            .update(&updated)
            .await
            .map_err(DtError::from)
            .log_internal("update_task_template")?;
        info!(template_id = id, "task template updated");
        Ok(saved)
    }

    /// Update from a raw request body; malformed fields are validation errors
    pub async fn update_from_json(&self, id: Id, payload: &Value) -> DtResult<TaskTemplate> {
        let patch = TemplatePatch::from_json(payload)?;
        self.update(id, patch).await
    }

    /// Update `id` when it exists, otherwise create from `create`
    #[instrument(skip(self, create, update, actor))]
    pub async fn upsert(
        &self,
        id: Id,
        create: NewTaskTemplate,
        update: TemplatePatch,
        actor: &dyn UserContext,
    ) -> DtResult<TaskTemplate> {
        match self.ctx.templates.find(id).await? {
            Some(_) => self.update(id, update).await,
            None => self.create(create, actor).await,
        }
    }

    /// Apply one patch to many templates
    ///
    /// Patches touching the workstation or the employee are refused before
    /// any lookup. Every template is validated before the first write; unknown
    /// ids are skipped. Returns how many templates were written.
    #[instrument(skip(self, patch), fields(count = ids.len()))]
    pub async fn update_many(&self, ids: &[Id], patch: TemplatePatch) -> DtResult<usize> {
        TeamInvariantGuard::check_bulk(&patch)?;

        let mut pending = Vec::with_capacity(ids.len());
        let mut errors = ValidationErrors::new();
        for &id in ids {
            let Some(current) = self.ctx.templates.find(id).await? else {
                continue;
            };
            let contract = UpdateTaskTemplateContract::new(&current);
            match contract.validate(&patch) {
                Ok(()) => pending.push(contract.merged(&patch)),
                Err(template_errors) => {
                    for message in template_errors.full_messages() {
                        errors.add_base(format!("task_template {}: {}", id, message));
                    }
                }
            }
        }
        errors.into_result()?;

        let now = self.ctx.clock.now();
        for mut template in pending.iter().cloned() {
            template.updated_at = now;
            self.ctx
                .templates
                .update(&template)
                .await
                .map_err(DtError::from)
                .log_internal("update_many_task_templates")?;
        }

        info!(updated = pending.len(), "task templates updated in bulk");
        Ok(pending.len())
    }

    /// Delete a template and all of its instances
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Id) -> DtResult<()> {
        self.find(id).await?;
        let removed = self.remove(id).await.log_internal("delete_task_template")?;
        info!(template_id = id, instances = removed, "task template deleted");
        Ok(())
    }

    /// Template row first; instances a failure leaves behind are unreachable
    /// without it.
    async fn remove(&self, id: Id) -> DtResult<u64> {
        if !self.ctx.templates.delete(id).await? {
            return Err(DtError::not_found("task_template", id));
        }
        Ok(self.ctx.instances.delete_for_template(id).await?)
    }
}
