//! Shared fixture for service tests
//!
//! Team 10 runs the grill (workstation 1) with Kim and Lee, team 20 runs the
//! bar (workstation 2) with Sam. Manager 100 manages team 10, manager 200
//! manages team 20. The clock sits at noon on Saturday 2025-02-15.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dt_contracts::Actor;
use dt_core::clock::{Clock, FixedClock};
use dt_core::traits::Id;
use dt_db::{
    InsertOutcome, InstanceStore, MemoryDirectory, RepositoryError, RepositoryResult, TemplateStore,
};
use dt_models::{
    AssignOutcome, Employee, NewTaskInstance, NewTaskTemplate, TaskInstance, TaskTemplate, Workstation,
};
use dt_notifications::{MemoryNotifier, NotificationService};

use crate::context::ServiceContext;

pub const TEAM: Id = 10;
pub const OTHER_TEAM: Id = 20;
pub const MANAGER: Id = 100;
pub const OTHER_MANAGER: Id = 200;
pub const GRILL: Id = 1;
pub const BAR: Id = 2;
pub const KIM: Id = 21;
pub const LEE: Id = 22;
pub const SAM: Id = 23;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 15).unwrap()
}

pub fn manager() -> Actor {
    Actor::new(MANAGER)
}

pub struct Fixture {
    pub ctx: ServiceContext,
    pub directory: Arc<MemoryDirectory>,
    pub clock: Arc<FixedClock>,
    pub notifier: Arc<MemoryNotifier>,
}

impl Fixture {
    pub async fn new() -> Self {
        let directory = Arc::new(MemoryDirectory::new());
        directory.add_manager(MANAGER, TEAM).await;
        directory.add_manager(OTHER_MANAGER, OTHER_TEAM).await;
        directory.add_workstation(Workstation::new(GRILL, "Grill", TEAM)).await;
        directory.add_workstation(Workstation::new(BAR, "Bar", OTHER_TEAM)).await;
        directory.add_employee(Employee::new(KIM, "Kim", TEAM)).await;
        directory.add_employee(Employee::new(LEE, "Lee", TEAM)).await;
        directory.add_employee(Employee::new(SAM, "Sam", OTHER_TEAM)).await;
        directory.link(GRILL, LEE).await;
        directory.link(GRILL, KIM).await;
        directory.link(BAR, SAM).await;

        let clock = Arc::new(FixedClock::at_date(today()));
        let notifier = Arc::new(MemoryNotifier::new());
        let ctx = ServiceContext::in_memory(directory.clone(), clock.clone())
            .with_notifications(NotificationService::new(Vec::new()).with_channel(notifier.clone()));

        Self {
            ctx,
            directory,
            clock,
            notifier,
        }
    }

    /// Store a template directly, bypassing the service
    pub async fn template(&self, new: NewTaskTemplate) -> TaskTemplate {
        self.ctx.templates.create(new, self.clock.now()).await.unwrap()
    }
}

fn unavailable() -> RepositoryError {
    RepositoryError::Storage("connection reset by peer".into())
}

/// Instance store that rejects every insert
pub struct ReadOnlyInstances(pub Arc<dyn InstanceStore>);

#[async_trait]
impl InstanceStore for ReadOnlyInstances {
    async fn find(&self, id: Id) -> RepositoryResult<Option<TaskInstance>> {
        self.0.find(id).await
    }

    async fn list_for_date(&self, date: NaiveDate) -> RepositoryResult<Vec<TaskInstance>> {
        self.0.list_for_date(date).await
    }

    async fn list_for_template(&self, template_id: Id, date: NaiveDate) -> RepositoryResult<Vec<TaskInstance>> {
        self.0.list_for_template(template_id, date).await
    }

    async fn create(&self, _new: NewTaskInstance, _now: DateTime<Utc>) -> RepositoryResult<TaskInstance> {
        Err(unavailable())
    }

    async fn create_unassigned_if_absent(
        &self,
        _template_id: Id,
        _date: NaiveDate,
        _now: DateTime<Utc>,
    ) -> RepositoryResult<InsertOutcome> {
        Err(unavailable())
    }

    async fn assign_employee(
        &self,
        instance_id: Id,
        employee_id: Id,
        now: DateTime<Utc>,
    ) -> RepositoryResult<(TaskInstance, AssignOutcome)> {
        self.0.assign_employee(instance_id, employee_id, now).await
    }

    async fn update_completion(
        &self,
        instance_id: Id,
        completed: bool,
        now: DateTime<Utc>,
    ) -> RepositoryResult<(TaskInstance, bool)> {
        self.0.update_completion(instance_id, completed, now).await
    }

    async fn delete_for_template(&self, template_id: Id) -> RepositoryResult<u64> {
        self.0.delete_for_template(template_id).await
    }
}

/// Template store whose deletes fail
pub struct UndeletableTemplates(pub Arc<dyn TemplateStore>);

#[async_trait]
impl TemplateStore for UndeletableTemplates {
    async fn find(&self, id: Id) -> RepositoryResult<Option<TaskTemplate>> {
        self.0.find(id).await
    }

    async fn list_recurring(&self) -> RepositoryResult<Vec<TaskTemplate>> {
        self.0.list_recurring().await
    }

    async fn create(&self, new: NewTaskTemplate, now: DateTime<Utc>) -> RepositoryResult<TaskTemplate> {
        self.0.create(new, now).await
    }

    async fn update(&self, template: &TaskTemplate) -> RepositoryResult<TaskTemplate> {
        self.0.update(template).await
    }

    async fn delete(&self, _id: Id) -> RepositoryResult<bool> {
        Err(unavailable())
    }
}
