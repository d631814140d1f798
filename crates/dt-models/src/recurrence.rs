//! Recurrence evaluation
//!
//! Decides whether a template is due on a calendar day. Pure and
//! deterministic: no clock reads, no I/O.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::task_template::{RecurrenceType, TaskTemplate};

/// Weekday number of a calendar day, 0 = Sunday … 6 = Saturday
pub fn weekday_number(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Set of weekdays encoded as 0 = Sunday … 6 = Saturday
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekdaySet(u8);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("weekday {0} is out of range (expected 0-6)")]
pub struct InvalidWeekday(pub i64);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    /// Build from day numbers; rejects anything outside 0–6
    pub fn from_days<I>(days: I) -> Result<Self, InvalidWeekday>
    where
        I: IntoIterator,
        I::Item: Into<i64>,
    {
        let mut bits = 0u8;
        for day in days {
            let day = day.into();
            if !(0..=6).contains(&day) {
                return Err(InvalidWeekday(day));
            }
            bits |= 1 << day;
        }
        Ok(Self(bits))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn contains(&self, day: u8) -> bool {
        day <= 6 && self.0 & (1 << day) != 0
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(weekday_number(date))
    }

    /// Day numbers in ascending order
    pub fn days(&self) -> Vec<u8> {
        (0..=6).filter(|d| self.contains(*d)).collect()
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.days()).finish()
    }
}

impl TryFrom<Vec<u8>> for WeekdaySet {
    type Error = InvalidWeekday;

    fn try_from(days: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_days(days)
    }
}

impl From<WeekdaySet> for Vec<u8> {
    fn from(set: WeekdaySet) -> Self {
        set.days()
    }
}

/// Whether `template` should have an instance on `date`
///
/// One-off templates are never due: they are materialized when created.
/// A weekly or x-per-week template with no days selected is due every day.
pub fn is_due(template: &TaskTemplate, date: NaiveDate) -> bool {
    if !template.is_recurring {
        return false;
    }
    match template.effective_recurrence() {
        RecurrenceType::Daily => true,
        RecurrenceType::Weekly | RecurrenceType::XPerWeek => {
            template.recurrence_days.is_empty() || template.recurrence_days.contains_date(date)
        }
    }
}

/// Due dates within `[from, to]`, ascending; empty when `to < from`
pub fn due_dates_between(template: &TaskTemplate, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| is_due(template, *d))
        .collect()
}
