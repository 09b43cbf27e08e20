use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_VENDOR: &str = "vendor";
pub const ROLE_CUSTOMER: &str = "customer";

pub const APPOINTMENT_SCHEDULED: &str = "scheduled";
pub const APPOINTMENT_COMPLETED: &str = "completed";
pub const APPOINTMENT_CANCELLED: &str = "cancelled";

#[derive(Debug, Error)]
#[error("unknown queue status: {0}")]
pub struct UnknownStatus(pub String);

/// Status of a queue entry. Serialized as the kebab-case tags clients send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueStatus {
    Pending,
    Accepted,
    CheckedIn,
    Received,
    Declined,
    Cancelled,
    NoShow,
    Completed,
}

/// Statuses that occupy a slot in a salon's queue.
pub const ACTIVE_STATUSES: [QueueStatus; 4] = [
    QueueStatus::Pending,
    QueueStatus::Accepted,
    QueueStatus::CheckedIn,
    QueueStatus::Received,
];

impl QueueStatus {
    pub const ALL: [QueueStatus; 8] = [
        QueueStatus::Pending,
        QueueStatus::Accepted,
        QueueStatus::CheckedIn,
        QueueStatus::Received,
        QueueStatus::Declined,
        QueueStatus::Cancelled,
        QueueStatus::NoShow,
        QueueStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Accepted => "accepted",
            QueueStatus::CheckedIn => "checked-in",
            QueueStatus::Received => "received",
            QueueStatus::Declined => "declined",
            QueueStatus::Cancelled => "cancelled",
            QueueStatus::NoShow => "no-show",
            QueueStatus::Completed => "completed",
        }
    }

    pub fn is_active(self) -> bool {
        ACTIVE_STATUSES.contains(&self)
    }

    /// Whether the state machine has an edge from `self` to `next`.
    pub fn can_transition_to(self, next: QueueStatus) -> bool {
        use QueueStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted | Received | CheckedIn | Declined | Cancelled)
                | (Accepted | Received, CheckedIn | Cancelled | NoShow)
                | (CheckedIn, Completed | NoShow | Cancelled)
        )
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        QueueStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

impl TryFrom<String> for QueueStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// SQL list literal of [`ACTIVE_STATUSES`], for use inside `concat!` query strings.
macro_rules! active_statuses_sql {
    () => {
        "'pending', 'accepted', 'checked-in', 'received'"
    };
}
pub(crate) use active_statuses_sql;

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub password_hash: String,
    pub active: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SalonRow {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub city: Option<String>,
    pub contact_no: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRow {
    pub id: String,
    pub user_id: String,
    pub salon_id: String,
    pub service: String,
    pub stylist: Option<String>,
    pub start_time: String,
    pub status: String,
    pub cancellation_reason: Option<String>,
    pub created_at: String,
}

/// Appointment joined with the salon name, as listed to its customer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentListRow {
    pub id: String,
    pub salon_id: String,
    pub salon_name: Option<String>,
    pub service: String,
    pub stylist: Option<String>,
    pub start_time: String,
    pub status: String,
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: String,
    pub salon_id: String,
    pub user_id: String,
    pub appointment_id: Option<String>,
    pub service: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: QueueStatus,
    pub position: i64,
    pub joined_at: String,
    pub checkin_time: Option<String>,
    pub estimated_start: Option<String>,
    pub estimated_wait_time: i64,
    pub cancel_reason: Option<String>,
    pub updated_at: String,
}

/// Queue entry with the customer and appointment fields a salon dashboard shows.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntryView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub entry: QueueEntry,
    pub user_name: Option<String>,
    pub user_phone: Option<String>,
    pub appointment_start: Option<String>,
    pub appointment_status: Option<String>,
}

/// The caller's own active entry with the context the customer screens need.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyQueueEntry {
    #[serde(flatten)]
    pub entry: QueueEntry,
    pub salon_name: Option<String>,
    pub now_serving_position: Option<i64>,
    pub people_ahead: i64,
}
