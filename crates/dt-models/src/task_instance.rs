//! Task instance model and its status transitions
//!
//! `UNASSIGNED -> ASSIGNED -> DONE`, with `DONE -> ASSIGNED` (uncomplete) and
//! `ASSIGNED -> ASSIGNED` (reassign). Reassignment to a different employee
//! always clears completion.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use dt_core::traits::Id;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    Unassigned,
    Assigned,
    Done,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unassigned => "UNASSIGNED",
            Self::Assigned => "ASSIGNED",
            Self::Done => "DONE",
        }
    }

    /// Whether a person holds the instance
    pub fn has_assignee(&self) -> bool {
        !matches!(self, Self::Unassigned)
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNASSIGNED" => Ok(Self::Unassigned),
            "ASSIGNED" => Ok(Self::Assigned),
            "DONE" => Ok(Self::Done),
            other => Err(format!("unknown instance status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("an unassigned task cannot be completed")]
    CompleteUnassigned,
}

/// Effect of an assignment on an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    /// Already held by this employee; nothing changed
    Unchanged,
    /// Newly assigned or moved to a different employee
    Assigned { previous_employee_id: Option<Id>, cleared_completion: bool },
}

/// One concrete occurrence of a template on one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInstance {
    pub id: Id,
    pub task_template_id: Id,
    pub employee_id: Option<Id>,
    pub date: NaiveDate,
    pub status: InstanceStatus,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskInstance {
    pub fn from_new(id: Id, new: NewTaskInstance, now: DateTime<Utc>) -> Self {
        Self {
            id,
            task_template_id: new.task_template_id,
            employee_id: new.employee_id,
            date: new.date,
            status: new.status,
            is_completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.status == InstanceStatus::Unassigned
    }

    /// `[midnight, next midnight)` of the instance's day, in UTC
    pub fn day_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        day_bounds(self.date)
    }

    /// Give the instance to `employee_id`
    pub fn assign_to(&mut self, employee_id: Id, now: DateTime<Utc>) -> AssignOutcome {
        if self.employee_id == Some(employee_id) && self.status.has_assignee() {
            return AssignOutcome::Unchanged;
        }

        let previous_employee_id = self.employee_id;
        let cleared_completion = self.is_completed;

        self.employee_id = Some(employee_id);
        self.status = InstanceStatus::Assigned;
        self.is_completed = false;
        self.completed_at = None;
        self.updated_at = now;

        AssignOutcome::Assigned {
            previous_employee_id,
            cleared_completion,
        }
    }

    /// Toggle completion; returns whether anything changed
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) -> Result<bool, TransitionError> {
        match (self.status, completed) {
            (InstanceStatus::Unassigned, true) => Err(TransitionError::CompleteUnassigned),
            (InstanceStatus::Assigned, true) => {
                self.status = InstanceStatus::Done;
                self.is_completed = true;
                self.completed_at = Some(now);
                self.updated_at = now;
                Ok(true)
            }
            (InstanceStatus::Done, false) => {
                self.status = InstanceStatus::Assigned;
                self.is_completed = false;
                self.completed_at = None;
                self.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// `[midnight, next midnight)` of a calendar day, in UTC
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_utc();
    (start, start + Duration::days(1))
}

/// Attributes for an instance that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewTaskInstance {
    pub task_template_id: Id,
    pub employee_id: Option<Id>,
    pub date: NaiveDate,
    pub status: InstanceStatus,
}

impl NewTaskInstance {
    pub fn unassigned(task_template_id: Id, date: NaiveDate) -> Self {
        Self {
            task_template_id,
            employee_id: None,
            date,
            status: InstanceStatus::Unassigned,
        }
    }

    pub fn assigned(task_template_id: Id, employee_id: Id, date: NaiveDate) -> Self {
        Self {
            task_template_id,
            employee_id: Some(employee_id),
            date,
            status: InstanceStatus::Assigned,
        }
    }
}
