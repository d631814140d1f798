//! Partial update of a task template
//!
//! Each field is a [`FieldUpdate`]: `Unset` keeps the stored value, `Set`
//! replaces it. For the optional linkage fields `Set(None)` clears the link.

use dt_core::error::ValidationErrors;
use dt_core::traits::Id;
use dt_core::types::FieldUpdate;
use serde_json::{Map, Value};

use crate::recurrence::WeekdaySet;
use crate::task_template::{RecurrenceType, TaskTemplate};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplatePatch {
    pub title: FieldUpdate<String>,
    pub description: FieldUpdate<Option<String>>,
    pub workstation_id: FieldUpdate<Option<Id>>,
    pub assigned_to_employee_id: FieldUpdate<Option<Id>>,
    pub is_recurring: FieldUpdate<bool>,
    pub recurrence_type: FieldUpdate<Option<RecurrenceType>>,
    pub recurrence_days: FieldUpdate<WeekdaySet>,
    pub target_per_week: FieldUpdate<Option<u8>>,
    pub notify_employee: FieldUpdate<bool>,
}

impl TemplatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = FieldUpdate::Set(title.into());
        self
    }

    pub fn workstation(mut self, workstation_id: Option<Id>) -> Self {
        self.workstation_id = FieldUpdate::Set(workstation_id);
        self
    }

    pub fn employee(mut self, employee_id: Option<Id>) -> Self {
        self.assigned_to_employee_id = FieldUpdate::Set(employee_id);
        self
    }

    pub fn recurrence(mut self, kind: Option<RecurrenceType>, days: WeekdaySet) -> Self {
        self.is_recurring = FieldUpdate::Set(kind.is_some());
        self.recurrence_type = FieldUpdate::Set(kind);
        self.recurrence_days = FieldUpdate::Set(days);
        self
    }

    /// Whether the patch would change who or where the task belongs to
    pub fn touches_linkage(&self) -> bool {
        self.workstation_id.is_set() || self.assigned_to_employee_id.is_set()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Effective `(workstation_id, assigned_to_employee_id)` once applied to `current`
    pub fn merged_linkage(&self, current: &TaskTemplate) -> (Option<Id>, Option<Id>) {
        (
            self.workstation_id.resolve_ref(&current.workstation_id),
            self.assigned_to_employee_id
                .resolve_ref(&current.assigned_to_employee_id),
        )
    }

    pub fn apply_to(self, template: &mut TaskTemplate) {
        self.title.apply_to(&mut template.title);
        self.description.apply_to(&mut template.description);
        self.workstation_id.apply_to(&mut template.workstation_id);
        self.assigned_to_employee_id
            .apply_to(&mut template.assigned_to_employee_id);
        self.is_recurring.apply_to(&mut template.is_recurring);
        self.recurrence_type.apply_to(&mut template.recurrence_type);
        self.recurrence_days.apply_to(&mut template.recurrence_days);
        self.target_per_week.apply_to(&mut template.target_per_week);
        self.notify_employee.apply_to(&mut template.notify_employee);
    }

    /// Read a patch from a request body
    ///
    /// Keys may be snake_case or camelCase. Linkage fields accept `null`, a
    /// numeric id, a string id, or `{"set": <value>}`; an empty string clears
    /// the link. Every malformed field is reported.
    pub fn from_json(payload: &Value) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let Some(obj) = payload.as_object() else {
            errors.add_base("payload must be a JSON object");
            return Err(errors);
        };

        let mut patch = Self::default();

        if let Some(v) = lookup(obj, "title", "title") {
            match v {
                Value::String(s) => patch.title = FieldUpdate::Set(s.clone()),
                _ => errors.add("title", "must be a string"),
            }
        }

        if let Some(v) = lookup(obj, "description", "description") {
            match v {
                Value::Null => patch.description = FieldUpdate::Set(None),
                Value::String(s) => patch.description = FieldUpdate::Set(Some(s.clone())),
                _ => errors.add("description", "must be a string or null"),
            }
        }

        patch.workstation_id =
            linkage_field(obj, "workstation_id", "workstationId", &mut errors);
        patch.assigned_to_employee_id = linkage_field(
            obj,
            "assigned_to_employee_id",
            "assignedToEmployeeId",
            &mut errors,
        );

        if let Some(v) = lookup(obj, "is_recurring", "isRecurring") {
            match v {
                Value::Bool(b) => patch.is_recurring = FieldUpdate::Set(*b),
                _ => errors.add("is_recurring", "must be a boolean"),
            }
        }

        if let Some(v) = lookup(obj, "recurrence_type", "recurrenceType") {
            match v {
                Value::Null => patch.recurrence_type = FieldUpdate::Set(None),
                Value::String(s) => match s.parse::<RecurrenceType>() {
                    Ok(kind) => patch.recurrence_type = FieldUpdate::Set(Some(kind)),
                    Err(_) => errors.add(
                        "recurrence_type",
                        "must be one of daily, weekly, x_per_week",
                    ),
                },
                _ => errors.add("recurrence_type", "must be a string or null"),
            }
        }

        if let Some(v) = lookup(obj, "recurrence_days", "recurrenceDays") {
            match weekday_set(v) {
                Some(days) => patch.recurrence_days = FieldUpdate::Set(days),
                None => errors.add(
                    "recurrence_days",
                    "must be a list of weekday numbers between 0 and 6",
                ),
            }
        }

        if let Some(v) = lookup(obj, "target_per_week", "targetPerWeek") {
            match v {
                Value::Null => patch.target_per_week = FieldUpdate::Set(None),
                other => match other.as_u64().and_then(|n| u8::try_from(n).ok()) {
                    Some(n) => patch.target_per_week = FieldUpdate::Set(Some(n)),
                    None => errors.add("target_per_week", "must be a whole number or null"),
                },
            }
        }

        if let Some(v) = lookup(obj, "notify_employee", "notifyEmployee") {
            match v {
                Value::Bool(b) => patch.notify_employee = FieldUpdate::Set(*b),
                _ => errors.add("notify_employee", "must be a boolean"),
            }
        }

        errors.into_result().map(|_| patch)
    }
}

fn lookup<'a>(obj: &'a Map<String, Value>, snake: &str, camel: &str) -> Option<&'a Value> {
    obj.get(snake).or_else(|| obj.get(camel))
}

fn linkage_field(
    obj: &Map<String, Value>,
    snake: &str,
    camel: &str,
    errors: &mut ValidationErrors,
) -> FieldUpdate<Option<Id>> {
    let Some(value) = lookup(obj, snake, camel) else {
        return FieldUpdate::Unset;
    };

    let value = match value {
        Value::Object(wrapper) => match wrapper.get("set") {
            Some(inner) if wrapper.len() == 1 => inner,
            _ => {
                errors.add(snake, "must be an id, null, or {\"set\": <id or null>}");
                return FieldUpdate::Unset;
            }
        },
        other => other,
    };

    match parse_linkage_id(value) {
        Some(id) => FieldUpdate::Set(id),
        None => {
            errors.add(snake, "must be an id, null, or {\"set\": <id or null>}");
            FieldUpdate::Unset
        }
    }
}

/// `Some(None)` clears, `Some(Some(id))` links, `None` is malformed
fn parse_linkage_id(value: &Value) -> Option<Option<Id>> {
    match value {
        Value::Null => Some(None),
        Value::Number(n) => n.as_i64().filter(|id| *id > 0).map(Some),
        Value::String(s) if s.trim().is_empty() => Some(None),
        Value::String(s) => s.trim().parse::<Id>().ok().filter(|id| *id > 0).map(Some),
        _ => None,
    }
}

fn weekday_set(value: &Value) -> Option<WeekdaySet> {
    match value {
        Value::Null => Some(WeekdaySet::EMPTY),
        Value::Array(items) => {
            let days = items.iter().map(Value::as_i64).collect::<Option<Vec<i64>>>()?;
            WeekdaySet::from_days(days).ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task_template::NewTaskTemplate;
    use serde_json::json;

    fn stored() -> TaskTemplate {
        let new = NewTaskTemplate::new("Restock napkins", 1)
            .at_workstation(3)
            .assigned_to(7)
            .daily();
        TaskTemplate::from_new(11, new, chrono::Utc::now())
    }

    #[test]
    fn test_linkage_shapes() {
        let patch = TemplatePatch::from_json(&json!({
            "workstationId": "12",
            "assigned_to_employee_id": {"set": null},
        }))
        .unwrap();
        assert_eq!(patch.workstation_id, FieldUpdate::Set(Some(12)));
        assert_eq!(patch.assigned_to_employee_id, FieldUpdate::Set(None));

        let patch = TemplatePatch::from_json(&json!({"workstation_id": 4})).unwrap();
        assert_eq!(patch.workstation_id, FieldUpdate::Set(Some(4)));
        assert_eq!(patch.assigned_to_employee_id, FieldUpdate::Unset);

        let patch = TemplatePatch::from_json(&json!({"workstation_id": {"set": "9"}})).unwrap();
        assert_eq!(patch.workstation_id, FieldUpdate::Set(Some(9)));
    }

    #[test]
    fn test_malformed_linkage_names_field() {
        for bad in [json!([1]), json!(true), json!({"id": 3}), json!("abc"), json!(1.5)] {
            let err = TemplatePatch::from_json(&json!({ "assignedToEmployeeId": bad })).unwrap_err();
            assert!(err.has_error("assigned_to_employee_id"), "{:?}", bad);
        }
    }

    #[test]
    fn test_non_object_payload() {
        let err = TemplatePatch::from_json(&json!([1, 2])).unwrap_err();
        assert_eq!(err.base_errors.len(), 1);
    }

    #[test]
    fn test_reports_every_bad_field() {
        let err = TemplatePatch::from_json(&json!({
            "title": 3,
            "recurrenceDays": [1, 8],
            "notifyEmployee": "yes",
        }))
        .unwrap_err();
        assert!(err.has_error("title"));
        assert!(err.has_error("recurrence_days"));
        assert!(err.has_error("notify_employee"));
    }

    #[test]
    fn test_merged_linkage() {
        let template = stored();

        let keep = TemplatePatch::new().title("Restock cups");
        assert_eq!(keep.merged_linkage(&template), (Some(3), Some(7)));

        let clear = TemplatePatch::new().workstation(None);
        assert_eq!(clear.merged_linkage(&template), (None, Some(7)));
        assert!(clear.touches_linkage());
    }

    #[test]
    fn test_apply_to() {
        let mut template = stored();
        TemplatePatch::from_json(&json!({
            "title": "Restock cups",
            "recurrenceType": "weekly",
            "recurrenceDays": [1, 3],
            "workstationId": null,
        }))
        .unwrap()
        .apply_to(&mut template);

        assert_eq!(template.title, "Restock cups");
        assert_eq!(template.recurrence_type, Some(RecurrenceType::Weekly));
        assert_eq!(template.recurrence_days.days(), vec![1, 3]);
        assert_eq!(template.workstation_id, None);
        assert_eq!(template.assigned_to_employee_id, Some(7));
    }
}
