use chrono::Utc;
use sqlx::SqlitePool;

use crate::{auth::new_id, models::SalonRow};

pub async fn find(pool: &SqlitePool, id: &str) -> Result<Option<SalonRow>, sqlx::Error> {
    sqlx::query_as::<_, SalonRow>(
        "SELECT id, name, owner_id, city, contact_no, created_at FROM salons WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn is_owner(pool: &SqlitePool, salon_id: &str, user_id: &str) -> Result<bool, sqlx::Error> {
    let owned = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM salons WHERE id = ? AND owner_id = ?",
    )
    .bind(salon_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(owned > 0)
}

pub async fn create(
    pool: &SqlitePool,
    name: &str,
    owner_id: &str,
    city: Option<&str>,
    contact_no: Option<&str>,
) -> Result<SalonRow, sqlx::Error> {
    let id = new_id();
    sqlx::query(
        r#"INSERT INTO salons (id, name, owner_id, city, contact_no, created_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(name)
    .bind(owner_id)
    .bind(city)
    .bind(contact_no)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    find(pool, &id).await?.ok_or(sqlx::Error::RowNotFound)
}
