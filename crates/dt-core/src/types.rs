//! Common types used throughout the scheduler

use serde::{Deserialize, Serialize};

/// A single field of a partial update
///
/// `Unset` leaves the stored value alone. `Set(v)` replaces it; for optional
/// fields `Set(None)` clears the value, which a plain `Option` cannot express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldUpdate<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T> FieldUpdate<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, FieldUpdate::Set(_))
    }

    /// Resolve against the current value: the update if set, else `current`
    pub fn resolve(self, current: T) -> T {
        match self {
            FieldUpdate::Unset => current,
            FieldUpdate::Set(value) => value,
        }
    }

    /// Resolve against a borrowed current value
    pub fn resolve_ref(&self, current: &T) -> T
    where
        T: Clone,
    {
        match self {
            FieldUpdate::Unset => current.clone(),
            FieldUpdate::Set(value) => value.clone(),
        }
    }

    pub fn as_ref(&self) -> FieldUpdate<&T> {
        match self {
            FieldUpdate::Unset => FieldUpdate::Unset,
            FieldUpdate::Set(value) => FieldUpdate::Set(value),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FieldUpdate<U> {
        match self {
            FieldUpdate::Unset => FieldUpdate::Unset,
            FieldUpdate::Set(value) => FieldUpdate::Set(f(value)),
        }
    }

    /// Apply the update in place
    pub fn apply_to(self, target: &mut T) {
        if let FieldUpdate::Set(value) = self {
            *target = value;
        }
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    /// `None` means "not provided"
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => FieldUpdate::Set(v),
            None => FieldUpdate::Unset,
        }
    }
}
