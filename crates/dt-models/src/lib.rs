//! # dt-models
//!
//! Domain models for the daily task scheduler.
//!
//! Templates describe recurring or one-off work, instances are the concrete
//! per-day occurrences, and the day preparation marker caches a manager's
//! readiness for a date. The recurrence evaluator lives here because it is a
//! pure function of a template and a calendar day.

pub use dt_core::traits::Id;

pub mod task_template;
pub mod template_patch;
pub mod task_instance;
pub mod day_preparation;
pub mod directory;
pub mod recurrence;

pub use task_template::{NewTaskTemplate, RecurrenceType, TaskTemplate};
pub use task_instance::{day_bounds, AssignOutcome, InstanceStatus, NewTaskInstance, TaskInstance, TransitionError};
pub use template_patch::TemplatePatch;
pub use day_preparation::DayPreparation;
pub use directory::{Employee, Workstation};
pub use recurrence::{due_dates_between, is_due, weekday_number, InvalidWeekday, WeekdaySet};
