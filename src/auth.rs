use actix_web::{dev::ServiceRequest, error::ErrorForbidden, error::ErrorUnauthorized, web, Error, HttpMessage};
use actix_web_httpauth::extractors::basic::BasicAuth;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    models::{UserRow, ROLE_ADMIN, ROLE_VENDOR},
    state::AppState,
};

pub const AUTH_REALM: &str = "Salon Queue";

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub display_name: String,
    pub role: String,
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed_hash = PasswordHash::new(password_hash);
    match parsed_hash {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

async fn authenticate(req: &ServiceRequest, credentials: &BasicAuth) -> Result<AuthUser, Error> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ErrorUnauthorized("Unauthorized"))?;
    let password = credentials.password().unwrap_or_default();
    match find_account(&state.db, credentials.user_id()).await {
        Ok(Some(user)) if verify_password(password, &user.password_hash) => {
            if user.active == 0 {
                log::warn!("login blocked for banned account {}", user.id);
                return Err(ErrorForbidden("Account banned"));
            }
            Ok(AuthUser {
                id: user.id,
                display_name: user.display_name,
                role: user.role,
            })
        }
        Ok(_) => Err(ErrorUnauthorized("Unauthorized")),
        Err(err) => {
            log::warn!("credential lookup failed: {err}");
            Err(ErrorUnauthorized("Unauthorized"))
        }
    }
}

async fn find_account(pool: &SqlitePool, username: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"SELECT id, username, display_name, role, password_hash, active, created_at
           FROM users WHERE username = ?"#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

async fn validate_with(
    req: ServiceRequest,
    credentials: BasicAuth,
    allowed: &[&str],
    denied: &'static str,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    match authenticate(&req, &credentials).await {
        Ok(user) => {
            if !allowed.is_empty() && !allowed.contains(&user.role.as_str()) {
                return Err((ErrorForbidden(denied), req));
            }
            req.extensions_mut().insert(user);
            Ok(req)
        }
        Err(err) => Err((err, req)),
    }
}

/// Any active account.
pub async fn basic_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    validate_with(req, credentials, &[], "Forbidden").await
}

pub async fn vendor_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    validate_with(req, credentials, &[ROLE_VENDOR, ROLE_ADMIN], "Vendor access required").await
}

pub async fn admin_validator(
    req: ServiceRequest,
    credentials: BasicAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    validate_with(req, credentials, &[ROLE_ADMIN], "Admin access required").await
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
