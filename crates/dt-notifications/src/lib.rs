//! # dt-notifications
//!
//! Task events for the daily task scheduler.
//!
//! Publication never blocks or fails the operation that raised the event:
//! channels are synchronous, non-blocking publishers, and the dispatcher logs
//! and swallows their errors.
//!
//! ## Channels
//!
//! - `BroadcastNotifier`: tokio broadcast channel for in-process subscribers
//! - `LogNotifier`: structured `tracing` record per event
//! - `MemoryNotifier`: keeps events in memory, for tests

pub mod event;
pub mod channels;
pub mod service;

pub use event::{Recipient, TaskEvent, TaskEventKind};
pub use channels::{BroadcastNotifier, LogNotifier, MemoryNotifier, Notifier, NotifyError, NotifyResult};
pub use service::NotificationService;
