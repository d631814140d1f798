//! Create contract for task templates

use dt_models::NewTaskTemplate;

use crate::base::{Contract, ValidationResult};
use super::base::TaskTemplateBaseContract;

/// Contract for creating a task template
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateTaskTemplateContract {
    base: TaskTemplateBaseContract,
}

impl CreateTaskTemplateContract {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Contract<NewTaskTemplate> for CreateTaskTemplateContract {
    fn validate(&self, entity: &NewTaskTemplate) -> ValidationResult {
        self.base.validate(entity)
    }
}
