//! Queue lifecycle: admission, position allocation, status transitions and
//! propagation onto linked appointments.
//!
//! Every operation runs inside a single request against the shared store.
//! Cross-request guarantees come from the store itself: the partial unique
//! indexes on active entries, the single-statement position allocation and
//! compare-and-set status updates.

mod admission;
mod booking;
mod estimator;
mod lifecycle;
mod sync;
mod views;

use sqlx::SqlitePool;

use crate::{
    auth::AuthUser,
    error::Result,
    models::{active_statuses_sql, QueueEntry},
    notifier::Notifier,
    state::QueueSettings,
};

pub use admission::NewEntry;
pub use booking::BookingRequest;
pub use estimator::DEFAULT_AVG_SERVICE_MINUTES;

pub(crate) const ENTRY_COLUMNS: &str = "id, salon_id, user_id, appointment_id, service, status, \
     position, joined_at, checkin_time, estimated_start, estimated_wait_time, cancel_reason, \
     updated_at";

/// Authenticated caller of a queue operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requester {
    pub user_id: String,
    pub role: String,
}

impl Requester {
    pub fn new(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: role.into(),
        }
    }
}

impl From<&AuthUser> for Requester {
    fn from(user: &AuthUser) -> Self {
        Self::new(user.id.clone(), user.role.clone())
    }
}

/// Borrowed handle bundling the store, the event notifier and queue settings.
pub struct QueueService<'a> {
    db: &'a SqlitePool,
    events: &'a Notifier,
    settings: QueueSettings,
}

impl<'a> QueueService<'a> {
    pub fn new(db: &'a SqlitePool, events: &'a Notifier, settings: QueueSettings) -> Self {
        Self {
            db,
            events,
            settings,
        }
    }

    pub async fn find_entry(&self, id: &str) -> Result<Option<QueueEntry>> {
        let entry = sqlx::query_as::<_, QueueEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM queue_entries WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.db)
        .await?;
        Ok(entry)
    }

    /// The user's entry currently holding a queue slot, if any.
    pub async fn active_entry_for(&self, user_id: &str) -> Result<Option<QueueEntry>> {
        let entry = sqlx::query_as::<_, QueueEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM queue_entries
             WHERE user_id = ? AND status IN ({})
             ORDER BY joined_at DESC
             LIMIT 1",
            active_statuses_sql!()
        ))
        .bind(user_id)
        .fetch_optional(self.db)
        .await?;
        Ok(entry)
    }
}
