use chrono::Utc;
use sqlx::SqliteConnection;

use super::{estimator::estimate, QueueService, Requester, ENTRY_COLUMNS};
use crate::{
    auth::new_id,
    error::{ServiceError, Result},
    models::{active_statuses_sql, QueueEntry},
    notifier::QueueEvent,
    salons,
};

/// Everything needed to admit a customer into a salon's queue.
#[derive(Clone, Debug, Default)]
pub struct NewEntry<'a> {
    pub salon_id: &'a str,
    pub user_id: &'a str,
    pub service: Option<&'a str>,
    pub appointment_id: Option<&'a str>,
    pub estimated_start: Option<&'a str>,
}

impl QueueService<'_> {
    /// Rejects users that already hold a slot in any salon's queue.
    pub async fn assert_admissible(&self, user_id: &str) -> Result<()> {
        let existing = sqlx::query_scalar::<_, String>(concat!(
            "SELECT id FROM queue_entries WHERE user_id = ? AND status IN (",
            active_statuses_sql!(),
            ") LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(self.db)
        .await?;

        match existing {
            Some(_) => Err(ServiceError::active_booking()),
            None => Ok(()),
        }
    }

    /// Walk-in join: the salon must exist, then the caller is admitted.
    pub async fn join(
        &self,
        requester: &Requester,
        salon_id: &str,
        service: Option<&str>,
    ) -> Result<QueueEntry> {
        if salons::find(self.db, salon_id).await?.is_none() {
            return Err(ServiceError::not_found("Salon"));
        }
        self.create_entry(NewEntry {
            salon_id,
            user_id: &requester.user_id,
            service,
            ..NewEntry::default()
        })
        .await
    }

    /// The only path that creates queue entries.
    ///
    /// The guard query gives the friendly rejection; the partial unique index
    /// on active entries per user is what holds under concurrent joins, and
    /// its violation surfaces as the same conflict.
    pub async fn create_entry(&self, new: NewEntry<'_>) -> Result<QueueEntry> {
        self.assert_admissible(new.user_id).await?;

        let id = new_id();
        let mut tx = self.db.begin().await?;
        let position = allocate_position(&mut tx, &id, &new)
            .await
            .map_err(admission_error)?;

        let wait = estimate(position, self.settings.avg_service_minutes);
        let entry = sqlx::query_as::<_, QueueEntry>(&format!(
            "UPDATE queue_entries SET estimated_wait_time = ? WHERE id = ? RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(wait)
        .bind(&id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        log::info!(
            "user {} joined salon {} queue at position {}",
            entry.user_id,
            entry.salon_id,
            entry.position
        );
        self.events.publish(QueueEvent::created(&entry));
        Ok(entry)
    }
}

/// Inserts the entry at (max active position in the salon) + 1.
///
/// Reading the maximum and inserting happen in one statement, so SQLite's
/// writer lock serializes concurrent joins for the same salon.
async fn allocate_position(
    conn: &mut SqliteConnection,
    id: &str,
    new: &NewEntry<'_>,
) -> Result<i64, sqlx::Error> {
    let now = Utc::now().to_rfc3339();
    sqlx::query_scalar::<_, i64>(concat!(
        "INSERT INTO queue_entries
           (id, salon_id, user_id, appointment_id, service, status, position, joined_at,
            estimated_start, estimated_wait_time, updated_at)
         SELECT ?, ?, ?, ?, ?, 'pending', COALESCE(MAX(position), 0) + 1, ?, ?, 0, ?
         FROM queue_entries
         WHERE salon_id = ? AND status IN (",
        active_statuses_sql!(),
        ")
         RETURNING position"
    ))
    .bind(id)
    .bind(new.salon_id)
    .bind(new.user_id)
    .bind(new.appointment_id)
    .bind(new.service)
    .bind(&now)
    .bind(new.estimated_start)
    .bind(&now)
    .bind(new.salon_id)
    .fetch_one(conn)
    .await
}

fn admission_error(err: sqlx::Error) -> ServiceError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.message().contains("queue_entries.user_id") {
            return ServiceError::active_booking();
        }
    }
    ServiceError::Store(err)
}
