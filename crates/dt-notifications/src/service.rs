//! Notification dispatch
//!
//! Hands each event to every configured channel. A failing channel is logged
//! at `warn` and skipped; the caller never sees the error.

use std::sync::Arc;

use dt_core::config::NotificationConfig;

use crate::channels::{BroadcastNotifier, LogNotifier, Notifier};
use crate::event::TaskEvent;

#[derive(Clone)]
pub struct NotificationService {
    channels: Vec<Arc<dyn Notifier>>,
    enabled: bool,
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::disabled()
    }
}

impl NotificationService {
    pub fn new(channels: Vec<Arc<dyn Notifier>>) -> Self {
        Self {
            channels,
            enabled: true,
        }
    }

    /// Drops every event
    pub fn disabled() -> Self {
        Self {
            channels: Vec::new(),
            enabled: false,
        }
    }

    /// Log channel plus a broadcast channel sized from configuration.
    /// The broadcast channel is returned so callers can subscribe.
    pub fn from_config(config: &NotificationConfig) -> (Self, Arc<BroadcastNotifier>) {
        let broadcast = Arc::new(BroadcastNotifier::new(config.broadcast_capacity));
        let channels: Vec<Arc<dyn Notifier>> = vec![Arc::new(LogNotifier), broadcast.clone()];
        let service = Self {
            channels,
            enabled: config.enabled,
        };
        (service, broadcast)
    }

    pub fn with_channel(mut self, channel: Arc<dyn Notifier>) -> Self {
        self.channels.push(channel);
        self
    }

    /// Publish to every channel; returns how many accepted the event
    pub fn dispatch(&self, event: &TaskEvent) -> usize {
        if !self.enabled {
            return 0;
        }

        let mut delivered = 0;
        for channel in &self.channels {
            match channel.publish(event) {
                Ok(()) => delivered += 1,
                Err(error) => {
                    tracing::warn!(
                        channel = channel.name(),
                        event_id = %event.id,
                        kind = event.kind.as_str(),
                        %error,
                        "failed to publish task event"
                    );
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{MemoryNotifier, NotifyError, NotifyResult};
    use chrono::{NaiveDate, Utc};
    use dt_models::{NewTaskInstance, TaskInstance};

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn publish(&self, _event: &TaskEvent) -> NotifyResult<()> {
            Err(NotifyError::DeliveryFailed("connection refused".into()))
        }
    }

    fn event() -> TaskEvent {
        let date = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        let instance = TaskInstance::from_new(1, NewTaskInstance::assigned(2, 3, date), Utc::now());
        TaskEvent::instance_updated(&instance, Some(4), Some(3), Utc::now())
    }

    #[test]
    fn test_failing_channel_does_not_stop_others() {
        let memory = Arc::new(MemoryNotifier::new());
        let channels: Vec<Arc<dyn Notifier>> = vec![Arc::new(FailingNotifier), memory.clone()];
        let service = NotificationService::new(channels);

        assert_eq!(service.dispatch(&event()), 1);
        assert_eq!(memory.events().len(), 1);
    }

    #[test]
    fn test_disabled_drops_events() {
        let memory = Arc::new(MemoryNotifier::new());
        let service = NotificationService::disabled().with_channel(memory.clone());

        assert_eq!(service.dispatch(&event()), 0);
        assert!(memory.events().is_empty());
    }

    #[tokio::test]
    async fn test_from_config_broadcasts() {
        let (service, broadcast) = NotificationService::from_config(&NotificationConfig::default());
        let mut rx = broadcast.subscribe();

        let sent = event();
        assert_eq!(service.dispatch(&sent), 2);
        assert_eq!(rx.recv().await.unwrap().id, sent.id);
    }
}
