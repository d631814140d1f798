//! Task events

use chrono::{DateTime, NaiveDate, Utc};
use dt_core::traits::Id;
use dt_models::{InstanceStatus, TaskInstance};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventKind {
    /// Instance given to an employee
    InstanceAssigned,
    /// Completion toggled or other change visible to the team
    InstanceUpdated,
}

impl TaskEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstanceAssigned => "instance_assigned",
            Self::InstanceUpdated => "instance_updated",
        }
    }
}

/// Who an event is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Recipient {
    Employee(Id),
    Team(Id),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEvent {
    pub id: Uuid,
    pub kind: TaskEventKind,
    pub instance_id: Id,
    pub task_template_id: Id,
    pub date: NaiveDate,
    pub employee_id: Option<Id>,
    pub status: InstanceStatus,
    pub recipients: Vec<Recipient>,
    /// Manager or employee who caused the change; `None` for system actions
    pub actor_id: Option<Id>,
    pub occurred_at: DateTime<Utc>,
}

impl TaskEvent {
    fn from_instance(
        kind: TaskEventKind,
        instance: &TaskInstance,
        recipients: Vec<Recipient>,
        actor_id: Option<Id>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            instance_id: instance.id,
            task_template_id: instance.task_template_id,
            date: instance.date,
            employee_id: instance.employee_id,
            status: instance.status,
            recipients,
            actor_id,
            occurred_at: now,
        }
    }

    /// Addressed to the new assignee and to the team
    pub fn instance_assigned(
        instance: &TaskInstance,
        team_id: Option<Id>,
        actor_id: Option<Id>,
        now: DateTime<Utc>,
    ) -> Self {
        let recipients = instance
            .employee_id
            .map(Recipient::Employee)
            .into_iter()
            .chain(team_id.map(Recipient::Team))
            .collect();
        Self::from_instance(TaskEventKind::InstanceAssigned, instance, recipients, actor_id, now)
    }

    /// Addressed to the team
    pub fn instance_updated(
        instance: &TaskInstance,
        team_id: Option<Id>,
        actor_id: Option<Id>,
        now: DateTime<Utc>,
    ) -> Self {
        let recipients = team_id.map(Recipient::Team).into_iter().collect();
        Self::from_instance(TaskEventKind::InstanceUpdated, instance, recipients, actor_id, now)
    }

    pub fn is_addressed_to(&self, recipient: Recipient) -> bool {
        self.recipients.contains(&recipient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dt_models::NewTaskInstance;

    fn instance() -> TaskInstance {
        let date = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        TaskInstance::from_new(3, NewTaskInstance::assigned(1, 5, date), Utc::now())
    }

    #[test]
    fn test_assigned_recipients() {
        let event = TaskEvent::instance_assigned(&instance(), Some(9), Some(2), Utc::now());
        assert_eq!(event.kind, TaskEventKind::InstanceAssigned);
        assert!(event.is_addressed_to(Recipient::Employee(5)));
        assert!(event.is_addressed_to(Recipient::Team(9)));
    }

    #[test]
    fn test_updated_goes_to_team_only() {
        let event = TaskEvent::instance_updated(&instance(), Some(9), Some(5), Utc::now());
        assert_eq!(event.recipients, vec![Recipient::Team(9)]);
    }

    #[test]
    fn test_serialization() {
        let event = TaskEvent::instance_updated(&instance(), Some(9), None, Utc::now());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "instance_updated");
        assert_eq!(json["recipients"][0]["type"], "team");
        assert_eq!(json["status"], "ASSIGNED");
    }
}
