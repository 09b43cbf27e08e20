use std::{fs, path::Path, str::FromStr};

use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    auth::{hash_password, new_id},
    config::SeedConfig,
    error::AccountError,
    models::{UserRow, ROLE_ADMIN, ROLE_VENDOR},
    salons,
};

pub async fn connect(db_url: &str) -> Result<SqlitePool, Box<dyn std::error::Error>> {
    ensure_sqlite_dir(db_url)?;

    let connect_options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub display_name: &'a str,
    pub phone: Option<&'a str>,
    pub role: &'a str,
    pub password: &'a str,
}

pub async fn create_user(pool: &SqlitePool, user: NewUser<'_>) -> Result<UserRow, AccountError> {
    let password_hash = hash_password(user.password).map_err(AccountError::Hash)?;
    let id = new_id();

    sqlx::query(
        r#"INSERT INTO users (id, username, display_name, phone, role, password_hash, active, created_at)
           VALUES (?, ?, ?, ?, ?, ?, 1, ?)"#,
    )
    .bind(&id)
    .bind(user.username)
    .bind(user.display_name)
    .bind(user.phone)
    .bind(user.role)
    .bind(password_hash)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    let row = sqlx::query_as::<_, UserRow>(
        r#"SELECT id, username, display_name, role, password_hash, active, created_at
           FROM users WHERE id = ?"#,
    )
    .bind(&id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Bans (`active = false`) or reinstates an account. `None` when the id is unknown.
pub async fn set_user_active(
    pool: &SqlitePool,
    id: &str,
    active: bool,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"UPDATE users SET active = ? WHERE id = ?
           RETURNING id, username, display_name, role, password_hash, active, created_at"#,
    )
    .bind(active)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn seed_defaults(pool: &SqlitePool, seed: &SeedConfig) -> Result<(), AccountError> {
    seed_admin(pool, seed).await?;
    if seed.demo {
        seed_demo_salon(pool, seed).await?;
    }
    Ok(())
}

async fn seed_admin(pool: &SqlitePool, seed: &SeedConfig) -> Result<(), AccountError> {
    let existing = sqlx::query_as::<_, (String,)>("SELECT id FROM users WHERE role = ? LIMIT 1")
        .bind(ROLE_ADMIN)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    if seed.admin_password == "admin" {
        log::warn!("ADMIN_PASSWORD not set. Using default password 'admin'. Set ADMIN_PASSWORD in production.");
    }

    create_user(
        pool,
        NewUser {
            username: &seed.admin_user,
            display_name: &seed.admin_display_name,
            phone: None,
            role: ROLE_ADMIN,
            password: &seed.admin_password,
        },
    )
    .await?;
    Ok(())
}

async fn seed_demo_salon(pool: &SqlitePool, seed: &SeedConfig) -> Result<(), AccountError> {
    let exists = sqlx::query_as::<_, (String,)>("SELECT id FROM users WHERE role = ? LIMIT 1")
        .bind(ROLE_VENDOR)
        .fetch_optional(pool)
        .await?;
    if exists.is_some() {
        return Ok(());
    }

    if seed.vendor_password == "change-me" {
        log::warn!("VENDOR_PASSWORD not set. Using default password 'change-me'. Set VENDOR_PASSWORD in production.");
    }

    let vendor = create_user(
        pool,
        NewUser {
            username: &seed.vendor_user,
            display_name: "Demo Vendor",
            phone: None,
            role: ROLE_VENDOR,
            password: &seed.vendor_password,
        },
    )
    .await?;
    let salon = salons::create(pool, "Demo Salon", &vendor.id, None, None).await?;
    log::info!("Seeded demo salon {} owned by {}", salon.id, vendor.username);
    Ok(())
}
