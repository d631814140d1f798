//! # dt-contracts
//!
//! Contract validation for the daily task scheduler.
//!
//! Contracts check an entity before it is created or updated and collect
//! every problem into `ValidationErrors`. The team invariant guard adds the
//! cross-entity rule that needs the team directory.

pub mod base;
pub mod task_templates;

pub use base::*;
