use chrono::Utc;

use super::{sync, QueueService, Requester, ENTRY_COLUMNS};
use crate::{
    error::{ServiceError, Result},
    models::{active_statuses_sql, QueueEntry, QueueStatus, ROLE_ADMIN},
    notifier::QueueEvent,
    salons,
};

const MAX_TRANSITION_ATTEMPTS: usize = 3;

impl QueueService<'_> {
    /// Vendor-driven status change. Only the owner of the entry's salon, or an
    /// admin, may call it.
    pub async fn set_status(
        &self,
        entry_id: &str,
        requester: &Requester,
        status: &str,
    ) -> Result<QueueEntry> {
        let next: QueueStatus = status
            .parse()
            .map_err(|_| ServiceError::InvalidStatus(status.to_string()))?;

        let entry = self
            .find_entry(entry_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Queue entry"))?;

        if requester.role != ROLE_ADMIN
            && !salons::is_owner(self.db, &entry.salon_id, &requester.user_id).await?
        {
            return Err(ServiceError::forbidden());
        }

        let updated = self.transition(entry, next, None).await?;
        log::info!(
            "vendor {} moved queue entry {} to {}",
            requester.user_id,
            updated.id,
            updated.status
        );

        sync::sync_appointment_for_status(self.db, &updated, next, None).await;
        self.events.publish(QueueEvent::updated(&updated));
        Ok(updated)
    }

    /// Customer cancellation of their own entry, either by id or whichever
    /// entry currently holds their slot.
    pub async fn cancel(
        &self,
        entry_id: Option<&str>,
        requester: &Requester,
        reason: Option<&str>,
    ) -> Result<QueueEntry> {
        let entry = match entry_id {
            Some(id) => self.find_entry(id).await?,
            None => self.active_entry_for(&requester.user_id).await?,
        }
        .ok_or_else(|| ServiceError::NotFound("No active booking found".to_string()))?;

        if entry.user_id != requester.user_id {
            return Err(ServiceError::forbidden());
        }

        let reason = reason.map(str::trim).filter(|value| !value.is_empty());
        let updated = self.transition(entry, QueueStatus::Cancelled, reason).await?;
        log::info!("user {} cancelled queue entry {}", requester.user_id, updated.id);

        sync::sync_appointment_for_status(self.db, &updated, QueueStatus::Cancelled, reason).await;
        self.events.publish(QueueEvent::updated(&updated));
        Ok(updated)
    }

    /// Frees the queue slot held by a cancelled appointment, if it still holds one.
    pub async fn cancel_for_appointment(
        &self,
        appointment_id: &str,
        reason: Option<&str>,
    ) -> Result<Option<QueueEntry>> {
        let entry = sqlx::query_as::<_, QueueEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM queue_entries
             WHERE appointment_id = ? AND status IN ({})
             LIMIT 1",
            active_statuses_sql!()
        ))
        .bind(appointment_id)
        .fetch_optional(self.db)
        .await?;

        let Some(entry) = entry else {
            return Ok(None);
        };

        match self.transition(entry, QueueStatus::Cancelled, reason).await {
            Ok(updated) => {
                self.events.publish(QueueEvent::updated(&updated));
                Ok(Some(updated))
            }
            // Someone else finished the entry first; nothing left to free.
            Err(ServiceError::InvalidTransition { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Applies `next` if the state machine allows it from the entry's current
    /// status. The update only lands if the status is still the one observed,
    /// so concurrent transitions on one entry apply in some serial order.
    async fn transition(
        &self,
        mut entry: QueueEntry,
        next: QueueStatus,
        reason: Option<&str>,
    ) -> Result<QueueEntry> {
        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            if !entry.status.can_transition_to(next) {
                return Err(ServiceError::InvalidTransition {
                    from: entry.status,
                    to: next,
                });
            }

            let now = Utc::now().to_rfc3339();
            let checkin_time = (next == QueueStatus::CheckedIn).then(|| now.clone());
            let updated = sqlx::query_as::<_, QueueEntry>(&format!(
                "UPDATE queue_entries
                 SET status = ?,
                     checkin_time = COALESCE(?, checkin_time),
                     cancel_reason = COALESCE(?, cancel_reason),
                     updated_at = ?
                 WHERE id = ? AND status = ?
                 RETURNING {ENTRY_COLUMNS}"
            ))
            .bind(next.as_str())
            .bind(checkin_time)
            .bind(reason)
            .bind(&now)
            .bind(&entry.id)
            .bind(entry.status.as_str())
            .fetch_optional(self.db)
            .await?;

            if let Some(updated) = updated {
                return Ok(updated);
            }

            entry = self
                .find_entry(&entry.id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Queue entry"))?;
        }

        Err(ServiceError::Conflict(
            "Queue entry is being updated by someone else, please retry".to_string(),
        ))
    }
}
