//! Task template contracts
//!
//! - base: title, linkage presence, recurrence configuration
//! - create / update: base rules on the resulting template
//! - team_invariant: workstation and employee share a team; no bulk relinking

mod base;
mod create;
mod update;
mod team_invariant;

pub use base::{TaskTemplateBaseContract, TaskTemplateData, TITLE_MAX_LENGTH};
pub use create::CreateTaskTemplateContract;
pub use update::UpdateTaskTemplateContract;
pub use team_invariant::TeamInvariantGuard;
