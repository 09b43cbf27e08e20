use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NewEntry, QueueService, Requester};
use crate::{
    appointments::{self, NewAppointment},
    error::{ServiceError, Result},
    models::{AppointmentRow, QueueEntry, APPOINTMENT_CANCELLED},
    notifier::QueueEvent,
    salons,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub salon_id: Option<String>,
    pub service: Option<String>,
    pub stylist: Option<String>,
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResult {
    pub appointment: AppointmentRow,
    pub queue_item: QueueEntry,
}

impl QueueService<'_> {
    /// Books an appointment and admits the customer into the salon's queue
    /// for it. The appointment is removed again if admission fails.
    pub async fn book_appointment(
        &self,
        requester: &Requester,
        request: &BookingRequest,
    ) -> Result<BookingResult> {
        let (Some(salon_id), Some(service), Some(start_time)) = (
            non_blank(&request.salon_id),
            non_blank(&request.service),
            non_blank(&request.start_time),
        ) else {
            return Err(ServiceError::BadRequest("Missing fields".to_string()));
        };
        let start_time = parse_start_time(start_time)
            .ok_or_else(|| ServiceError::BadRequest("Invalid startTime".to_string()))?;

        if salons::find(self.db, salon_id).await?.is_none() {
            return Err(ServiceError::not_found("Salon"));
        }

        let appointment = appointments::create(
            self.db,
            NewAppointment {
                user_id: &requester.user_id,
                salon_id,
                service,
                stylist: non_blank(&request.stylist),
                start_time: &start_time,
            },
        )
        .await?;

        let admitted = self
            .create_entry(NewEntry {
                salon_id,
                user_id: &requester.user_id,
                service: Some(service),
                appointment_id: Some(&appointment.id),
                estimated_start: Some(&start_time),
            })
            .await;

        let queue_item = match admitted {
            Ok(entry) => entry,
            Err(err) => {
                self.discard_appointment(&appointment.id).await;
                return Err(err);
            }
        };

        if let Err(err) =
            appointments::record_last_booking(self.db, &requester.user_id, &start_time).await
        {
            log::warn!("could not record last booking for {}: {err}", requester.user_id);
        }

        Ok(BookingResult {
            appointment,
            queue_item,
        })
    }

    /// Customer cancels an appointment directly; a queue slot still held for
    /// it is released too.
    pub async fn cancel_appointment(
        &self,
        appointment_id: &str,
        requester: &Requester,
        reason: Option<&str>,
    ) -> Result<AppointmentRow> {
        let appointment = appointments::find(self.db, appointment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Appointment"))?;

        if appointment.user_id != requester.user_id {
            return Err(ServiceError::Forbidden("Not authorized".to_string()));
        }
        if appointment.status == APPOINTMENT_CANCELLED {
            return Err(ServiceError::BadRequest("Already cancelled".to_string()));
        }

        let reason = reason.map(str::trim).filter(|value| !value.is_empty());
        appointments::update_status(self.db, appointment_id, APPOINTMENT_CANCELLED, reason).await?;
        self.events.publish(QueueEvent::appointment_cancelled(
            appointment_id,
            &appointment.salon_id,
        ));

        if let Some(entry) = self.cancel_for_appointment(appointment_id, reason).await? {
            log::info!(
                "released queue entry {} with cancelled appointment {appointment_id}",
                entry.id
            );
        }

        appointments::find(self.db, appointment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Appointment"))
    }

    async fn discard_appointment(&self, appointment_id: &str) {
        match appointments::delete(self.db, appointment_id).await {
            Ok(_) => log::info!("removed appointment {appointment_id} after failed queue admission"),
            Err(err) => log::error!(
                "appointment {appointment_id} left without a queue slot, delete failed: {err}"
            ),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

/// Accepts RFC 3339 or a zone-less `datetime-local` value (read as UTC).
fn parse_start_time(raw: &str) -> Option<String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc).to_rfc3339());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc().to_rfc3339())
}
