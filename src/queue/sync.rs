use sqlx::SqlitePool;

use crate::{
    appointments,
    models::{QueueEntry, QueueStatus, APPOINTMENT_CANCELLED, APPOINTMENT_COMPLETED},
};

pub const NO_SHOW_REASON: &str = "Marked as no-show by vendor";
pub const DECLINED_REASON: &str = "Declined by vendor";
pub const QUEUE_CANCEL_REASON: &str = "Cancelled from queue";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppointmentUpdate {
    pub status: &'static str,
    pub cancellation_reason: Option<String>,
}

/// What a linked appointment becomes when its queue entry reaches `status`.
/// `None` for statuses that leave the appointment alone.
pub fn appointment_update_for(status: QueueStatus, reason: Option<&str>) -> Option<AppointmentUpdate> {
    let (status, cancellation_reason) = match status {
        QueueStatus::Completed => (APPOINTMENT_COMPLETED, None),
        QueueStatus::NoShow => (APPOINTMENT_CANCELLED, Some(NO_SHOW_REASON.to_string())),
        QueueStatus::Declined => (APPOINTMENT_CANCELLED, Some(DECLINED_REASON.to_string())),
        QueueStatus::Cancelled => (
            APPOINTMENT_CANCELLED,
            Some(reason.unwrap_or(QUEUE_CANCEL_REASON).to_string()),
        ),
        QueueStatus::Pending | QueueStatus::Accepted | QueueStatus::CheckedIn | QueueStatus::Received => {
            return None
        }
    };
    Some(AppointmentUpdate {
        status,
        cancellation_reason,
    })
}

/// Best-effort: the queue entry's already committed status is authoritative,
/// so a failed appointment write is logged and not rolled back.
pub async fn sync_appointment_for_status(
    pool: &SqlitePool,
    entry: &QueueEntry,
    status: QueueStatus,
    reason: Option<&str>,
) {
    let Some(appointment_id) = entry.appointment_id.as_deref() else {
        return;
    };
    let Some(update) = appointment_update_for(status, reason) else {
        return;
    };

    match appointments::update_status(
        pool,
        appointment_id,
        update.status,
        update.cancellation_reason.as_deref(),
    )
    .await
    {
        Ok(true) => {}
        Ok(false) => log::warn!(
            "queue entry {} links missing appointment {appointment_id}",
            entry.id
        ),
        Err(err) => log::warn!(
            "failed to sync appointment {appointment_id} to {}: {err}",
            update.status
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_table() {
        assert_eq!(
            appointment_update_for(QueueStatus::Completed, None),
            Some(AppointmentUpdate {
                status: "completed",
                cancellation_reason: None
            })
        );
        assert_eq!(
            appointment_update_for(QueueStatus::NoShow, Some("ignored")),
            Some(AppointmentUpdate {
                status: "cancelled",
                cancellation_reason: Some(NO_SHOW_REASON.to_string())
            })
        );
        assert_eq!(
            appointment_update_for(QueueStatus::Declined, None)
                .and_then(|update| update.cancellation_reason),
            Some(DECLINED_REASON.to_string())
        );
        assert_eq!(
            appointment_update_for(QueueStatus::Cancelled, Some("Too far"))
                .and_then(|update| update.cancellation_reason),
            Some("Too far".to_string())
        );
        assert_eq!(
            appointment_update_for(QueueStatus::Cancelled, None)
                .and_then(|update| update.cancellation_reason),
            Some(QUEUE_CANCEL_REASON.to_string())
        );
    }

    #[test]
    fn active_statuses_leave_appointment_alone() {
        for status in crate::models::ACTIVE_STATUSES {
            assert_eq!(appointment_update_for(status, None), None);
        }
    }
}
