//! # dt-services
//!
//! Business logic for the daily task scheduler.
//!
//! Each service is a thin object over a shared [`ServiceContext`] holding the
//! stores, the team directory, the clock and the notification dispatcher.
//! [`DailyTaskScheduler`] gathers them behind one facade.

pub mod context;
pub mod scope;
pub mod task_templates;
pub mod generator;
pub mod assignments;
pub mod day_preparation;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use context::ServiceContext;
pub use task_templates::TaskTemplateService;
pub use generator::{GenerationReport, InstanceGenerator};
pub use assignments::AssignmentService;
pub use day_preparation::{DayPreparationService, PreparationSummary, UnassignedTemplate};
pub use scheduler::{Dashboard, DailyTaskScheduler};
