//! Shared service dependencies

use std::sync::Arc;

use dt_core::clock::{Clock, SystemClock};
use dt_core::config::{AppConfig, SchedulerConfig};
use dt_db::{
    Database, InstanceStore, MemoryDirectory, MemoryInstanceStore, MemoryPreparationStore,
    MemoryTemplateStore, PgInstanceStore, PgPreparationStore, PgTeamDirectory, PgTemplateStore,
    PreparationStore, TeamDirectory, TemplateStore,
};
use dt_notifications::NotificationService;

/// Everything a service call may touch
#[derive(Clone)]
pub struct ServiceContext {
    pub templates: Arc<dyn TemplateStore>,
    pub instances: Arc<dyn InstanceStore>,
    pub preparations: Arc<dyn PreparationStore>,
    pub directory: Arc<dyn TeamDirectory>,
    pub clock: Arc<dyn Clock>,
    pub notifications: NotificationService,
    pub config: SchedulerConfig,
}

impl ServiceContext {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        instances: Arc<dyn InstanceStore>,
        preparations: Arc<dyn PreparationStore>,
        directory: Arc<dyn TeamDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            templates,
            instances,
            preparations,
            directory,
            clock,
            notifications: NotificationService::disabled(),
            config: SchedulerConfig::default(),
        }
    }

    /// PostgreSQL stores on one pool, wall clock in the configured offset
    pub fn postgres(db: &Database, config: &AppConfig, notifications: NotificationService) -> Self {
        let pool = db.pool().clone();
        Self {
            templates: Arc::new(PgTemplateStore::new(pool.clone())),
            instances: Arc::new(PgInstanceStore::new(pool.clone())),
            preparations: Arc::new(PgPreparationStore::new(pool.clone())),
            directory: Arc::new(PgTeamDirectory::new(pool)),
            clock: Arc::new(SystemClock::with_offset_minutes(config.scheduler.utc_offset_minutes)),
            notifications,
            config: config.scheduler.clone(),
        }
    }

    /// Fresh in-memory stores around the given directory and clock
    pub fn in_memory(directory: Arc<MemoryDirectory>, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(MemoryTemplateStore::new()),
            Arc::new(MemoryInstanceStore::new()),
            Arc::new(MemoryPreparationStore::new()),
            directory,
            clock,
        )
    }

    pub fn with_notifications(mut self, notifications: NotificationService) -> Self {
        self.notifications = notifications;
        self
    }
}
