//! # dt-db
//!
//! Storage layer for the daily task scheduler.
//!
//! The scheduler only talks to the traits in [`repository`]. Two
//! implementations are provided:
//!
//! - PostgreSQL repositories on SQLx, with the uniqueness rules enforced by
//!   the indexes in `sql/schema.sql`
//! - In-memory stores on `tokio::sync::RwLock` for tests and single-process use
//!
//! ## Example
//!
//! ```ignore
//! use dt_core::config::DatabaseConfig;
//! use dt_db::{Database, PgInstanceStore};
//!
//! let db = Database::connect(&DatabaseConfig::default()).await?;
//! let instances = PgInstanceStore::new(db.pool().clone());
//! ```

pub mod pool;
pub mod repository;
pub mod memory;
pub mod templates;
pub mod instances;
pub mod preparations;
pub mod directory;

// Re-exports
pub use pool::{Database, PoolStats};
pub use repository::{
    InsertOutcome, InstanceStore, PreparationStore, RepositoryError, RepositoryResult,
    TeamDirectory, TemplateStore,
};
pub use memory::{
    MemoryDirectory, MemoryInstanceStore, MemoryPreparationStore, MemoryTemplateStore,
};
pub use templates::{PgTemplateStore, TaskTemplateRow};
pub use instances::{PgInstanceStore, TaskInstanceRow};
pub use preparations::{DayPreparationRow, PgPreparationStore};
pub use directory::PgTeamDirectory;
