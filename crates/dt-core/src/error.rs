//! Core error types for the daily task scheduler
//!
//! Every business-rule failure is a typed value. Infrastructure failures carry
//! their detail for the logs but surface an opaque message to callers.

use std::collections::HashMap;
use thiserror::Error;

/// Core error type for all scheduler operations
#[derive(Error, Debug)]
pub enum DtError {
    #[error("Not found: {entity} with id={id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DtError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DtError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        DtError::Forbidden {
            message: message.into(),
        }
    }

    /// Single-field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        DtError::Validation(errors)
    }
}

/// Validation errors collection (field name -> messages, plus base messages)
#[derive(Error, Debug, Default, Clone, PartialEq)]
#[error("Validation errors: {errors:?}")]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> Vec<error_messages>
    pub errors: HashMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    /// Turn the collection into a result, `Ok` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        let mut fields: Vec<_> = self.errors.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        for (field, field_messages) in fields {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }
}

/// Cross-entity rules on task templates
///
/// Messages only reference what the caller already supplied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("the workstation and the assigned employee must belong to the same team")]
    SameTeam,

    #[error("bulk updates may not change the workstation or the assigned employee; update each template individually")]
    BulkLinkageUpdate,
}

/// HTTP status code mapping for errors
impl DtError {
    pub fn status_code(&self) -> u16 {
        match self {
            DtError::NotFound { .. } => 404,
            DtError::Forbidden { .. } => 403,
            DtError::Validation(_) | DtError::Invariant(_) => 422,
            DtError::Conflict { .. } => 409,
            DtError::Database(_) | DtError::Internal(_) | DtError::Config(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            DtError::NotFound { .. } => "not_found",
            DtError::Forbidden { .. } => "forbidden",
            DtError::Validation(_) => "validation_failed",
            DtError::Invariant(_) => "invariant_violated",
            DtError::Conflict { .. } => "conflict",
            DtError::Database(_) => "database_error",
            DtError::Internal(_) => "internal_error",
            DtError::Config(_) => "configuration_error",
        }
    }

    /// Whether this is an infrastructure failure rather than a business rule
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            DtError::Database(_) | DtError::Internal(_) | DtError::Config(_)
        )
    }

    /// Message safe to hand back to an API caller
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "internal error".to_string()
        } else {
            self.to_string()
        }
    }
}
