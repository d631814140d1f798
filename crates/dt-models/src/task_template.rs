//! Task template model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use dt_core::traits::Id;
use serde::{Deserialize, Serialize};

use crate::recurrence::WeekdaySet;

/// How a recurring template repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    XPerWeek,
}

impl RecurrenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::XPerWeek => "x_per_week",
        }
    }

    /// Whether the template's weekday set is consulted
    pub fn uses_weekdays(&self) -> bool {
        matches!(self, Self::Weekly | Self::XPerWeek)
    }
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "x_per_week" => Ok(Self::XPerWeek),
            other => Err(format!("unknown recurrence type: {}", other)),
        }
    }
}

/// Task template entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplate {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub workstation_id: Option<Id>,
    pub assigned_to_employee_id: Option<Id>,
    pub is_recurring: bool,
    pub recurrence_type: Option<RecurrenceType>,
    pub recurrence_days: WeekdaySet,
    /// Advisory only; nothing in scheduling reads it
    pub target_per_week: Option<u8>,
    pub notify_employee: bool,
    pub created_by_id: Id,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskTemplate {
    /// Persisted template built from creation attributes
    pub fn from_new(id: Id, new: NewTaskTemplate, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            workstation_id: new.workstation_id,
            assigned_to_employee_id: new.assigned_to_employee_id,
            is_recurring: new.is_recurring,
            recurrence_type: new.recurrence_type,
            recurrence_days: new.recurrence_days,
            target_per_week: new.target_per_week,
            notify_employee: new.notify_employee,
            created_by_id: new.created_by_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Recurrence rule in force; recurring templates without one repeat daily
    pub fn effective_recurrence(&self) -> RecurrenceType {
        self.recurrence_type.unwrap_or(RecurrenceType::Daily)
    }

    /// Weekly-style rule with no weekdays selected, which schedules every day
    pub fn has_implicit_every_day(&self) -> bool {
        self.is_recurring
            && self.effective_recurrence().uses_weekdays()
            && self.recurrence_days.is_empty()
    }
}

/// Attributes for a template that has not been stored yet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewTaskTemplate {
    pub title: String,
    pub description: Option<String>,
    pub workstation_id: Option<Id>,
    pub assigned_to_employee_id: Option<Id>,
    pub is_recurring: bool,
    pub recurrence_type: Option<RecurrenceType>,
    pub recurrence_days: WeekdaySet,
    pub target_per_week: Option<u8>,
    pub notify_employee: bool,
    pub created_by_id: Id,
}

impl NewTaskTemplate {
    pub fn new(title: impl Into<String>, created_by_id: Id) -> Self {
        Self {
            title: title.into(),
            created_by_id,
            ..Default::default()
        }
    }

    pub fn at_workstation(mut self, workstation_id: Id) -> Self {
        self.workstation_id = Some(workstation_id);
        self
    }

    pub fn assigned_to(mut self, employee_id: Id) -> Self {
        self.assigned_to_employee_id = Some(employee_id);
        self
    }

    pub fn daily(mut self) -> Self {
        self.is_recurring = true;
        self.recurrence_type = Some(RecurrenceType::Daily);
        self
    }

    pub fn weekly(mut self, days: WeekdaySet) -> Self {
        self.is_recurring = true;
        self.recurrence_type = Some(RecurrenceType::Weekly);
        self.recurrence_days = days;
        self
    }

    pub fn x_per_week(mut self, days: WeekdaySet, target: u8) -> Self {
        self.is_recurring = true;
        self.recurrence_type = Some(RecurrenceType::XPerWeek);
        self.recurrence_days = days;
        self.target_per_week = Some(target);
        self
    }

    pub fn notify_employee(mut self, notify: bool) -> Self {
        self.notify_employee = notify;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recurrence_type_round_trip_names() {
        for kind in [RecurrenceType::Daily, RecurrenceType::Weekly, RecurrenceType::XPerWeek] {
            assert_eq!(kind.as_str().parse::<RecurrenceType>(), Ok(kind));
        }
        assert_eq!(
            serde_json::to_string(&RecurrenceType::XPerWeek).unwrap(),
            "\"x_per_week\""
        );
        assert!("monthly".parse::<RecurrenceType>().is_err());
    }

    #[test]
    fn test_implicit_every_day() {
        let new = NewTaskTemplate::new("Restock", 1)
            .at_workstation(3)
            .weekly(WeekdaySet::EMPTY);
        let template = TaskTemplate::from_new(1, new, Utc::now());
        assert!(template.has_implicit_every_day());

        let daily = TaskTemplate::from_new(2, NewTaskTemplate::new("Mop", 1).daily(), Utc::now());
        assert!(!daily.has_implicit_every_day());
    }
}
