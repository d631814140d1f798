//! Base contract for task templates

use dt_core::error::ValidationErrors;
use dt_core::traits::Id;
use dt_models::{NewTaskTemplate, TaskTemplate};

use crate::base::{Contract, ValidationResult};

pub const TITLE_MAX_LENGTH: usize = 255;

/// Template attributes the contracts read
pub trait TaskTemplateData: Send + Sync {
    fn title(&self) -> &str;
    fn workstation_id(&self) -> Option<Id>;
    fn assigned_to_employee_id(&self) -> Option<Id>;
    fn target_per_week(&self) -> Option<u8>;
}

macro_rules! impl_template_data {
    ($ty:ty) => {
        impl TaskTemplateData for $ty {
            fn title(&self) -> &str { &self.title }
            fn workstation_id(&self) -> Option<Id> { self.workstation_id }
            fn assigned_to_employee_id(&self) -> Option<Id> { self.assigned_to_employee_id }
            fn target_per_week(&self) -> Option<u8> { self.target_per_week }
        }
    };
}

impl_template_data!(TaskTemplate);
impl_template_data!(NewTaskTemplate);

/// Rules every template must satisfy, whatever the operation
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskTemplateBaseContract;

impl TaskTemplateBaseContract {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_title(&self, title: &str, errors: &mut ValidationErrors) {
        if title.trim().is_empty() {
            errors.add("title", "can't be blank");
        } else if title.chars().count() > TITLE_MAX_LENGTH {
            errors.add("title", "is too long (maximum is 255 characters)");
        }
    }

    /// A template must be reachable through a workstation or a person
    pub fn validate_linkage_present(
        &self,
        workstation_id: Option<Id>,
        employee_id: Option<Id>,
        errors: &mut ValidationErrors,
    ) {
        if workstation_id.is_none() && employee_id.is_none() {
            errors.add_base("a workstation or an assigned employee is required");
        }
    }

    /// `target_per_week` is advisory, so only its range is checked
    pub fn validate_recurrence<T: TaskTemplateData>(&self, entity: &T, errors: &mut ValidationErrors) {
        if let Some(target) = entity.target_per_week() {
            if !(1..=7).contains(&target) {
                errors.add("target_per_week", "must be between 1 and 7");
            }
        }
    }
}

impl<T: TaskTemplateData> Contract<T> for TaskTemplateBaseContract {
    fn validate(&self, entity: &T) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_title(entity.title(), &mut errors);
        self.validate_linkage_present(
            entity.workstation_id(),
            entity.assigned_to_employee_id(),
            &mut errors,
        );
        self.validate_recurrence(entity, &mut errors);

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dt_models::WeekdaySet;

    fn valid() -> NewTaskTemplate {
        NewTaskTemplate::new("Clean the grill", 1).at_workstation(2).daily()
    }

    #[test]
    fn test_valid_template() {
        assert!(TaskTemplateBaseContract::new().validate(&valid()).is_ok());
    }

    #[test]
    fn test_blank_and_long_title() {
        let contract = TaskTemplateBaseContract::new();

        let mut blank = valid();
        blank.title = "   ".into();
        assert!(contract.validate(&blank).unwrap_err().has_error("title"));

        let mut long = valid();
        long.title = "x".repeat(256);
        assert!(contract.validate(&long).unwrap_err().has_error("title"));

        long.title = "x".repeat(255);
        assert!(contract.validate(&long).is_ok());
    }

    #[test]
    fn test_requires_workstation_or_employee() {
        let mut orphan = valid();
        orphan.workstation_id = None;

        let errors = TaskTemplateBaseContract::new().validate(&orphan).unwrap_err();
        assert_eq!(errors.base_errors.len(), 1);

        orphan.assigned_to_employee_id = Some(7);
        assert!(TaskTemplateBaseContract::new().validate(&orphan).is_ok());
    }

    #[test]
    fn test_target_per_week_range() {
        let days = WeekdaySet::from_days([1i64, 3, 5]).unwrap();
        let contract = TaskTemplateBaseContract::new();

        let ok = valid().x_per_week(days, 3);
        assert!(contract.validate(&ok).is_ok());

        let zero = valid().x_per_week(days, 0);
        assert!(contract.validate(&zero).unwrap_err().has_error("target_per_week"));

        let eight = valid().x_per_week(days, 8);
        assert!(contract.validate(&eight).unwrap_err().has_error("target_per_week"));

        let mut unset = valid().x_per_week(days, 3);
        unset.target_per_week = None;
        assert!(contract.validate(&unset).is_ok());
    }
}
