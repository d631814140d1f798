//! In-memory stores for tests and single-process use
//!
//! Each compound operation runs under one write guard, which gives it the same
//! atomicity the PostgreSQL stores get from constraints and row locks.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dt_core::traits::Id;
use dt_models::{
    AssignOutcome, DayPreparation, Employee, InstanceStatus, NewTaskInstance, NewTaskTemplate,
    TaskInstance, TaskTemplate, Workstation,
};
use tokio::sync::RwLock;

use crate::repository::{
    InsertOutcome, InstanceStore, PreparationStore, RepositoryError, RepositoryResult,
    TeamDirectory, TemplateStore,
};

/// In-memory template store
pub struct MemoryTemplateStore {
    templates: RwLock<HashMap<Id, TaskTemplate>>,
    next_id: AtomicI64,
}

impl Default for MemoryTemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.templates.read().await.len()
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn find(&self, id: Id) -> RepositoryResult<Option<TaskTemplate>> {
        Ok(self.templates.read().await.get(&id).cloned())
    }

    async fn list_recurring(&self) -> RepositoryResult<Vec<TaskTemplate>> {
        let templates = self.templates.read().await;
        let mut recurring: Vec<TaskTemplate> =
            templates.values().filter(|t| t.is_recurring).cloned().collect();
        recurring.sort_by_key(|t| t.id);
        Ok(recurring)
    }

    async fn create(&self, new: NewTaskTemplate, now: DateTime<Utc>) -> RepositoryResult<TaskTemplate> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let template = TaskTemplate::from_new(id, new, now);
        self.templates.write().await.insert(id, template.clone());
        Ok(template)
    }

    async fn update(&self, template: &TaskTemplate) -> RepositoryResult<TaskTemplate> {
        let mut templates = self.templates.write().await;
        match templates.get_mut(&template.id) {
            Some(stored) => {
                *stored = template.clone();
                Ok(template.clone())
            }
            None => Err(RepositoryError::NotFound(format!("task_template {}", template.id))),
        }
    }

    async fn delete(&self, id: Id) -> RepositoryResult<bool> {
        Ok(self.templates.write().await.remove(&id).is_some())
    }
}

/// In-memory instance store
pub struct MemoryInstanceStore {
    instances: RwLock<HashMap<Id, TaskInstance>>,
    next_id: AtomicI64,
}

impl Default for MemoryInstanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryInstanceStore {
    pub fn new() -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.instances.read().await.len()
    }

    fn insert_locked(
        &self,
        instances: &mut HashMap<Id, TaskInstance>,
        new: NewTaskInstance,
        now: DateTime<Utc>,
    ) -> TaskInstance {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let instance = TaskInstance::from_new(id, new, now);
        instances.insert(id, instance.clone());
        instance
    }
}

fn same_slot(instance: &TaskInstance, template_id: Id, date: NaiveDate) -> bool {
    instance.task_template_id == template_id && instance.date == date
}

#[async_trait]
impl InstanceStore for MemoryInstanceStore {
    async fn find(&self, id: Id) -> RepositoryResult<Option<TaskInstance>> {
        Ok(self.instances.read().await.get(&id).cloned())
    }

    async fn list_for_date(&self, date: NaiveDate) -> RepositoryResult<Vec<TaskInstance>> {
        let instances = self.instances.read().await;
        let mut found: Vec<TaskInstance> =
            instances.values().filter(|i| i.date == date).cloned().collect();
        found.sort_by_key(|i| i.id);
        Ok(found)
    }

    async fn list_for_template(&self, template_id: Id, date: NaiveDate) -> RepositoryResult<Vec<TaskInstance>> {
        let instances = self.instances.read().await;
        let mut found: Vec<TaskInstance> = instances
            .values()
            .filter(|i| same_slot(i, template_id, date))
            .cloned()
            .collect();
        found.sort_by_key(|i| i.id);
        Ok(found)
    }

    async fn create(&self, new: NewTaskInstance, now: DateTime<Utc>) -> RepositoryResult<TaskInstance> {
        let mut instances = self.instances.write().await;

        let clash = instances.values().any(|i| {
            same_slot(i, new.task_template_id, new.date)
                && match new.employee_id {
                    Some(employee_id) => i.employee_id == Some(employee_id),
                    None => i.status == InstanceStatus::Unassigned,
                }
        });
        if clash {
            return Err(RepositoryError::Conflict(format!(
                "task_template {} already has this instance on {}",
                new.task_template_id, new.date
            )));
        }

        Ok(self.insert_locked(&mut instances, new, now))
    }

    async fn create_unassigned_if_absent(
        &self,
        template_id: Id,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> RepositoryResult<InsertOutcome> {
        let mut instances = self.instances.write().await;

        if instances.values().any(|i| same_slot(i, template_id, date)) {
            return Ok(InsertOutcome::Existing);
        }

        let created = self.insert_locked(&mut instances, NewTaskInstance::unassigned(template_id, date), now);
        Ok(InsertOutcome::Created(created))
    }

    async fn assign_employee(
        &self,
        instance_id: Id,
        employee_id: Id,
        now: DateTime<Utc>,
    ) -> RepositoryResult<(TaskInstance, AssignOutcome)> {
        let mut instances = self.instances.write().await;

        let current = instances
            .get(&instance_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("task_instance {}", instance_id)))?;

        let taken = instances.values().any(|i| {
            i.id != instance_id
                && same_slot(i, current.task_template_id, current.date)
                && i.employee_id == Some(employee_id)
        });
        if taken {
            return Err(RepositoryError::Conflict(format!(
                "employee {} already holds task_template {} on {}",
                employee_id, current.task_template_id, current.date
            )));
        }

        let mut updated = current;
        let outcome = updated.assign_to(employee_id, now);
        instances.insert(instance_id, updated.clone());
        Ok((updated, outcome))
    }

    async fn update_completion(
        &self,
        instance_id: Id,
        completed: bool,
        now: DateTime<Utc>,
    ) -> RepositoryResult<(TaskInstance, bool)> {
        let mut instances = self.instances.write().await;

        let instance = instances
            .get_mut(&instance_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("task_instance {}", instance_id)))?;

        let changed = instance
            .set_completed(completed, now)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
        Ok((instance.clone(), changed))
    }

    async fn delete_for_template(&self, template_id: Id) -> RepositoryResult<u64> {
        let mut instances = self.instances.write().await;
        let before = instances.len();
        instances.retain(|_, i| i.task_template_id != template_id);
        Ok((before - instances.len()) as u64)
    }
}

/// In-memory day preparation store
#[derive(Default)]
pub struct MemoryPreparationStore {
    markers: RwLock<HashMap<(Id, NaiveDate), DayPreparation>>,
}

impl MemoryPreparationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreparationStore for MemoryPreparationStore {
    async fn find(&self, manager_id: Id, date: NaiveDate) -> RepositoryResult<Option<DayPreparation>> {
        Ok(self.markers.read().await.get(&(manager_id, date)).cloned())
    }

    async fn mark_prepared(&self, manager_id: Id, date: NaiveDate, now: DateTime<Utc>) -> RepositoryResult<DayPreparation> {
        let mut markers = self.markers.write().await;
        let marker = markers
            .entry((manager_id, date))
            .or_insert_with(|| DayPreparation::new(manager_id, date, now));
        marker.mark_prepared(now);
        Ok(marker.clone())
    }

    async fn clear_prepared(&self, manager_id: Id, date: NaiveDate, now: DateTime<Utc>) -> RepositoryResult<DayPreparation> {
        let mut markers = self.markers.write().await;
        let marker = markers
            .entry((manager_id, date))
            .or_insert_with(|| DayPreparation::new(manager_id, date, now));
        marker.clear(now);
        Ok(marker.clone())
    }
}

/// In-memory team directory, populated by the caller
#[derive(Default)]
pub struct MemoryDirectory {
    managers: RwLock<HashMap<Id, HashSet<Id>>>,
    workstations: RwLock<HashMap<Id, Workstation>>,
    employees: RwLock<HashMap<Id, Employee>>,
    links: RwLock<HashMap<Id, Vec<Id>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_manager(&self, manager_id: Id, team_id: Id) {
        self.managers.write().await.entry(manager_id).or_default().insert(team_id);
    }

    pub async fn add_workstation(&self, workstation: Workstation) {
        self.workstations.write().await.insert(workstation.id, workstation);
    }

    pub async fn add_employee(&self, employee: Employee) {
        self.employees.write().await.insert(employee.id, employee);
    }

    /// Link an employee to a workstation so they become a candidate for its tasks
    pub async fn link(&self, workstation_id: Id, employee_id: Id) {
        let mut links = self.links.write().await;
        let linked = links.entry(workstation_id).or_default();
        if !linked.contains(&employee_id) {
            linked.push(employee_id);
        }
    }
}

#[async_trait]
impl TeamDirectory for MemoryDirectory {
    async fn teams_managed_by(&self, manager_id: Id) -> RepositoryResult<Vec<Id>> {
        let managers = self.managers.read().await;
        let mut teams: Vec<Id> = managers
            .get(&manager_id)
            .map(|teams| teams.iter().copied().collect())
            .unwrap_or_default();
        teams.sort_unstable();
        Ok(teams)
    }

    async fn workstation(&self, id: Id) -> RepositoryResult<Option<Workstation>> {
        Ok(self.workstations.read().await.get(&id).cloned())
    }

    async fn employee(&self, id: Id) -> RepositoryResult<Option<Employee>> {
        Ok(self.employees.read().await.get(&id).cloned())
    }

    async fn employees_at_workstation(&self, workstation_id: Id) -> RepositoryResult<Vec<Employee>> {
        let links = self.links.read().await;
        let employees = self.employees.read().await;
        let mut linked: Vec<Employee> = links
            .get(&workstation_id)
            .into_iter()
            .flatten()
            .filter_map(|id| employees.get(id).cloned())
            .collect();
        linked.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(linked)
    }
}
