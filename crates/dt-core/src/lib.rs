//! # dt-core
//!
//! Core types, traits, and utilities for the daily task scheduler.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types and the invariant taxonomy
//! - Result type aliases
//! - Identifier and timestamp traits
//! - The `FieldUpdate` tagged value for partial updates
//! - The injectable clock
//! - Configuration types

pub mod error;
pub mod result;
pub mod traits;
pub mod types;
pub mod clock;
pub mod config;

pub use error::*;
pub use result::*;
pub use traits::*;
pub use types::*;
pub use clock::{Clock, FixedClock, SystemClock};
