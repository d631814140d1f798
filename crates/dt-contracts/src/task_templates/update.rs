//! Update contract for task templates
//!
//! Rules apply to the template as it would be after the patch, so clearing
//! one link is fine as long as the other remains.

use dt_models::{TaskTemplate, TemplatePatch};

use crate::base::{Contract, ValidationResult};
use super::base::TaskTemplateBaseContract;

/// Contract for updating an existing task template
pub struct UpdateTaskTemplateContract<'a> {
    base: TaskTemplateBaseContract,
    current: &'a TaskTemplate,
}

impl<'a> UpdateTaskTemplateContract<'a> {
    pub fn new(current: &'a TaskTemplate) -> Self {
        Self {
            base: TaskTemplateBaseContract::new(),
            current,
        }
    }

    /// The template with `patch` applied
    pub fn merged(&self, patch: &TemplatePatch) -> TaskTemplate {
        let mut merged = self.current.clone();
        patch.clone().apply_to(&mut merged);
        merged
    }
}

impl<'a> Contract<TemplatePatch> for UpdateTaskTemplateContract<'a> {
    fn validate(&self, patch: &TemplatePatch) -> ValidationResult {
        self.base.validate(&self.merged(patch))
    }
}
