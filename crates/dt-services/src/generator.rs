//! Instance generation
//!
//! Creates the `UNASSIGNED` instance of every recurring template due on a day
//! that has none yet. Strictly additive: never updates or deletes. Safe to run
//! any number of times and concurrently; the store's atomic insert decides
//! which caller creates the row.

use chrono::NaiveDate;
use dt_core::error::DtError;
use dt_core::result::{DtResult, ResultExt};
use dt_core::traits::Id;
use dt_db::InsertOutcome;
use dt_models::{is_due, TaskTemplate};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, field, info, instrument, warn};

use crate::context::ServiceContext;
use crate::scope::templates_in_scope;

/// Counts from one generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub date: NaiveDate,
    pub created: usize,
    pub skipped: usize,
    /// `"template <id>: <message>"` per failed template; internal causes read
    /// `internal error` and are only logged in full
    pub errors: Vec<String>,
}

impl GenerationReport {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            created: 0,
            skipped: 0,
            errors: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

enum TemplateOutcome {
    Created,
    Skipped,
    Failed(String),
}

#[derive(Clone)]
pub struct InstanceGenerator {
    ctx: ServiceContext,
}

impl InstanceGenerator {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Generate instances for `date`
    ///
    /// With `scope`, only templates whose team is listed are considered (the
    /// dashboard path); without it every recurring template is (the cron path).
    /// A failing template is reported and does not stop the others. A template
    /// whose team cannot be resolved is left out of a scoped run, not reported,
    /// since it may belong to someone else.
    #[instrument(
        skip(self),
        fields(created = field::Empty, skipped = field::Empty, errors = field::Empty)
    )]
    pub async fn generate(&self, date: NaiveDate, scope: Option<&[Id]>) -> DtResult<GenerationReport> {
        let templates = self
            .ctx
            .templates
            .list_recurring()
            .await
            .map_err(DtError::from)
            .log_internal("generate")?;

        let mut due: Vec<TaskTemplate> = templates.into_iter().filter(|t| is_due(t, date)).collect();
        if let Some(teams) = scope {
            due = templates_in_scope(self.ctx.directory.as_ref(), due, teams).await.in_scope;
        }
        debug!(due = due.len(), "due templates");

        let concurrency = self.ctx.config.generation_concurrency.max(1);
        let outcomes: Vec<TemplateOutcome> = stream::iter(due)
            .map(|template| self.generate_one(template, date))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut report = GenerationReport::new(date);
        for outcome in outcomes {
            match outcome {
                TemplateOutcome::Created => report.created += 1,
                TemplateOutcome::Skipped => report.skipped += 1,
                TemplateOutcome::Failed(message) => report.errors.push(message),
            }
        }
        report.errors.sort();

        let span = tracing::Span::current();
        span.record("created", report.created as u64);
        span.record("skipped", report.skipped as u64);
        span.record("errors", report.errors.len() as u64);

        if report.is_clean() {
            info!(created = report.created, skipped = report.skipped, "instance generation finished");
        } else {
            warn!(
                created = report.created,
                skipped = report.skipped,
                errors = report.errors.len(),
                "instance generation finished with errors"
            );
        }

        Ok(report)
    }

    async fn generate_one(&self, template: TaskTemplate, date: NaiveDate) -> TemplateOutcome {
        match self.try_generate_one(&template, date).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(template_id = template.id, error = %err, "instance generation failed for template");
                TemplateOutcome::Failed(format!("template {}: {}", template.id, err.public_message()))
            }
        }
    }

    async fn try_generate_one(&self, template: &TaskTemplate, date: NaiveDate) -> DtResult<TemplateOutcome> {
        let now = self.ctx.clock.now();
        match self.ctx.instances.create_unassigned_if_absent(template.id, date, now).await? {
            InsertOutcome::Created(instance) => {
                debug!(template_id = template.id, instance_id = instance.id, "instance created");
                Ok(TemplateOutcome::Created)
            }
            InsertOutcome::Existing => Ok(TemplateOutcome::Skipped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use dt_core::clock::Clock;
    use dt_models::{InstanceStatus, NewTaskInstance, NewTaskTemplate, WeekdaySet};

    #[tokio::test]
    async fn test_generates_only_due_recurring_templates() {
        let fx = Fixture::new().await;
        let daily = fx.template(NewTaskTemplate::new("Clean grill", MANAGER).at_workstation(GRILL).daily()).await;
        fx.template(
            NewTaskTemplate::new("Deep clean", MANAGER)
                .at_workstation(GRILL)
                .weekly(WeekdaySet::from_days([1, 3]).unwrap()),
        )
        .await;
        fx.template(NewTaskTemplate::new("Fix hood", MANAGER).at_workstation(GRILL)).await;

        let report = InstanceGenerator::new(fx.ctx.clone()).generate(today(), None).await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 0);
        assert!(report.is_clean());

        let instances = fx.ctx.instances.list_for_date(today()).await.unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].task_template_id, daily.id);
        assert_eq!(instances[0].status, InstanceStatus::Unassigned);
    }

    #[tokio::test]
    async fn test_second_run_skips() {
        let fx = Fixture::new().await;
        fx.template(NewTaskTemplate::new("Clean grill", MANAGER).at_workstation(GRILL).daily()).await;
        let generator = InstanceGenerator::new(fx.ctx.clone());

        generator.generate(today(), None).await.unwrap();
        let second = generator.generate(today(), None).await.unwrap();

        assert_eq!(second.created, 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(fx.ctx.instances.list_for_date(today()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_assigned_instance_counts_as_existing() {
        let fx = Fixture::new().await;
        let template = fx.template(NewTaskTemplate::new("Clean grill", MANAGER).at_workstation(GRILL).daily()).await;
        fx.ctx
            .instances
            .create(NewTaskInstance::assigned(template.id, KIM, today()), fx.clock.now())
            .await
            .unwrap();

        let report = InstanceGenerator::new(fx.ctx.clone()).generate(today(), None).await.unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_scope_limits_teams() {
        let fx = Fixture::new().await;
        fx.template(NewTaskTemplate::new("Clean grill", MANAGER).at_workstation(GRILL).daily()).await;
        fx.template(NewTaskTemplate::new("Polish taps", OTHER_MANAGER).at_workstation(BAR).daily()).await;

        let report = InstanceGenerator::new(fx.ctx.clone())
            .generate(today(), Some(&[TEAM][..]))
            .await
            .unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test]
    async fn test_storage_failures_are_reported_opaquely() {
        let mut fx = Fixture::new().await;
        let template = fx.template(NewTaskTemplate::new("Clean grill", MANAGER).at_workstation(GRILL).daily()).await;
        fx.ctx.instances = std::sync::Arc::new(ReadOnlyInstances(fx.ctx.instances.clone()));

        let report = InstanceGenerator::new(fx.ctx.clone()).generate(today(), None).await.unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.errors, vec![format!("template {}: internal error", template.id)]);
    }

    #[tokio::test]
    async fn test_concurrent_runs_create_one_row() {
        let fx = Fixture::new().await;
        fx.template(NewTaskTemplate::new("Clean grill", MANAGER).at_workstation(GRILL).daily()).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let generator = InstanceGenerator::new(fx.ctx.clone());
            handles.push(tokio::spawn(async move { generator.generate(today(), None).await.unwrap() }));
        }

        let mut created = 0;
        for handle in handles {
            created += handle.await.unwrap().created;
        }
        assert_eq!(created, 1);
        assert_eq!(fx.ctx.instances.list_for_date(today()).await.unwrap().len(), 1);
    }
}
