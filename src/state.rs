use sqlx::SqlitePool;

use crate::notifier::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub events: Notifier,
    pub queue: QueueSettings,
}

#[derive(Clone, Copy, Debug)]
pub struct QueueSettings {
    pub avg_service_minutes: i64,
}

impl AppState {
    pub fn queue_service(&self) -> crate::queue::QueueService<'_> {
        crate::queue::QueueService::new(&self.db, &self.events, self.queue)
    }
}
