use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{QueueEntry, QueueStatus};

pub const QUEUE_NEW: &str = "queue:new";
pub const QUEUE_UPDATE: &str = "queue:update";
pub const APPOINTMENT_CANCELLED: &str = "appointment:cancelled";

/// Real-time event fanned out to dashboards and customer views.
///
/// Serializes to the bare payload; the event name travels separately as the
/// SSE `event:` field.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueueEvent {
    New(NewEntryPayload),
    Update(StatusPayload),
    AppointmentCancelled(AppointmentPayload),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntryPayload {
    pub salon_id: String,
    pub id: String,
    pub position: i64,
    pub status: QueueStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub id: String,
    pub status: QueueStatus,
    pub salon_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPayload {
    pub appointment_id: String,
    pub salon_id: String,
}

impl QueueEvent {
    pub fn created(entry: &QueueEntry) -> Self {
        Self::New(NewEntryPayload {
            salon_id: entry.salon_id.clone(),
            id: entry.id.clone(),
            position: entry.position,
            status: entry.status,
        })
    }

    pub fn updated(entry: &QueueEntry) -> Self {
        Self::Update(StatusPayload {
            id: entry.id.clone(),
            status: entry.status,
            salon_id: entry.salon_id.clone(),
        })
    }

    pub fn appointment_cancelled(appointment_id: &str, salon_id: &str) -> Self {
        Self::AppointmentCancelled(AppointmentPayload {
            appointment_id: appointment_id.to_string(),
            salon_id: salon_id.to_string(),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::New(_) => QUEUE_NEW,
            Self::Update(_) => QUEUE_UPDATE,
            Self::AppointmentCancelled(_) => APPOINTMENT_CANCELLED,
        }
    }

    pub fn salon_id(&self) -> &str {
        match self {
            Self::New(payload) => &payload.salon_id,
            Self::Update(payload) => &payload.salon_id,
            Self::AppointmentCancelled(payload) => &payload.salon_id,
        }
    }
}

/// Fire-and-forget publisher. A disabled notifier drops every event.
#[derive(Clone, Debug, Default)]
pub struct Notifier {
    sender: Option<broadcast::Sender<QueueEvent>>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Some(sender),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Option<broadcast::Receiver<QueueEvent>> {
        self.sender.as_ref().map(broadcast::Sender::subscribe)
    }

    pub fn publish(&self, event: QueueEvent) {
        let Some(sender) = &self.sender else {
            return;
        };
        log::debug!("publishing {} for salon {}", event.name(), event.salon_id());
        // Err only means nobody is listening right now.
        let _ = sender.send(event);
    }
}
