use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    auth::new_id,
    models::{AppointmentListRow, AppointmentRow, APPOINTMENT_SCHEDULED},
};

const APPOINTMENT_COLUMNS: &str = "id, user_id, salon_id, service, stylist, start_time, status, \
                                   cancellation_reason, created_at";

pub struct NewAppointment<'a> {
    pub user_id: &'a str,
    pub salon_id: &'a str,
    pub service: &'a str,
    pub stylist: Option<&'a str>,
    pub start_time: &'a str,
}

pub async fn create(
    pool: &SqlitePool,
    new: NewAppointment<'_>,
) -> Result<AppointmentRow, sqlx::Error> {
    let id = new_id();
    sqlx::query(
        r#"INSERT INTO appointments
           (id, user_id, salon_id, service, stylist, start_time, status, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(new.user_id)
    .bind(new.salon_id)
    .bind(new.service)
    .bind(new.stylist)
    .bind(new.start_time)
    .bind(APPOINTMENT_SCHEDULED)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    find(pool, &id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<AppointmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AppointmentRow>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Returns false when no appointment has this id.
pub async fn update_status(
    pool: &SqlitePool,
    id: &str,
    status: &str,
    cancellation_reason: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE appointments
           SET status = ?, cancellation_reason = COALESCE(?, cancellation_reason)
           WHERE id = ?"#,
    )
    .bind(status)
    .bind(cancellation_reason)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<AppointmentListRow>, sqlx::Error> {
    sqlx::query_as::<_, AppointmentListRow>(
        r#"SELECT a.id, a.salon_id, s.name AS salon_name, a.service, a.stylist, a.start_time,
                  a.status, a.cancellation_reason
           FROM appointments a
           LEFT JOIN salons s ON s.id = a.salon_id
           WHERE a.user_id = ?
           ORDER BY a.start_time ASC
           LIMIT 100"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn record_last_booking(
    pool: &SqlitePool,
    user_id: &str,
    start_time: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_booking_at = ? WHERE id = ?")
        .bind(start_time)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
