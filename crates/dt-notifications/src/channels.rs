//! Event publication channels

use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::event::TaskEvent;

/// Channel errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Channel disabled")]
    Disabled,
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
}

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Fire-and-forget event sink
///
/// `publish` must return promptly; it is called on the request path.
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn publish(&self, event: &TaskEvent) -> NotifyResult<()>;
}

/// In-process fan-out over a tokio broadcast channel
pub struct BroadcastNotifier {
    sender: broadcast::Sender<TaskEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.sender.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn name(&self) -> &'static str {
        "broadcast"
    }

    fn publish(&self, event: &TaskEvent) -> NotifyResult<()> {
        // No subscribers is not a failure; nobody is listening yet
        if self.sender.receiver_count() == 0 {
            tracing::debug!(event_id = %event.id, "no broadcast subscribers");
            return Ok(());
        }
        self.sender
            .send(event.clone())
            .map(|_| ())
            .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))
    }
}

/// Writes one structured log record per event
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    fn publish(&self, event: &TaskEvent) -> NotifyResult<()> {
        tracing::info!(
            event_id = %event.id,
            kind = event.kind.as_str(),
            instance_id = event.instance_id,
            task_template_id = event.task_template_id,
            date = %event.date,
            employee_id = ?event.employee_id,
            recipients = event.recipients.len(),
            "task event"
        );
        Ok(())
    }
}

/// Keeps published events; for tests
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    events: Mutex<Vec<TaskEvent>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Notifier for MemoryNotifier {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn publish(&self, event: &TaskEvent) -> NotifyResult<()> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        Ok(())
    }
}
