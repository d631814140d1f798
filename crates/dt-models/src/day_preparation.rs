//! Day preparation marker
//!
//! Cache of a manager's readiness for a date. Recomputed on every dashboard
//! evaluation; never a source of truth.

use chrono::{DateTime, NaiveDate, Utc};
use dt_core::traits::Id;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPreparation {
    pub manager_id: Id,
    pub date: NaiveDate,
    /// First moment readiness was reached, cleared when it regresses
    pub prepared_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl DayPreparation {
    pub fn new(manager_id: Id, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            manager_id,
            date,
            prepared_at: None,
            updated_at: now,
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared_at.is_some()
    }

    /// Record readiness, keeping the first timestamp; returns whether it changed
    pub fn mark_prepared(&mut self, now: DateTime<Utc>) -> bool {
        if self.prepared_at.is_some() {
            return false;
        }
        self.prepared_at = Some(now);
        self.updated_at = now;
        true
    }

    /// Drop readiness; returns whether it changed
    pub fn clear(&mut self, now: DateTime<Utc>) -> bool {
        if self.prepared_at.is_none() {
            return false;
        }
        self.prepared_at = None;
        self.updated_at = now;
        true
    }
}
