//! Base contract system

use dt_core::error::ValidationErrors;
use dt_core::traits::Id;

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

/// The person performing an operation
pub trait UserContext: Send + Sync {
    fn id(&self) -> Id;
}

/// Authenticated caller, as handed over by the session layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Id,
}

impl Actor {
    pub fn new(id: Id) -> Self {
        Self { id }
    }
}

impl UserContext for Actor {
    fn id(&self) -> Id {
        self.id
    }
}

/// Base contract trait
pub trait Contract<T>: Send + Sync {
    /// Validate the entity
    fn validate(&self, entity: &T) -> ValidationResult;
}
