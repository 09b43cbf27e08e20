use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{admin_validator, AuthUser},
    db::{create_user, set_user_active, NewUser},
    error::{Result, ServiceError},
    models::{UserRow, ROLE_CUSTOMER, ROLE_VENDOR},
    salons,
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserBody {
    username: String,
    display_name: Option<String>,
    password: String,
    role: Option<String>,
    phone: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSalonBody {
    name: String,
    owner_id: String,
    city: Option<String>,
    contact_no: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(HttpAuthentication::basic(admin_validator))
            .service(web::resource("/users").route(web::post().to(create_account)))
            .service(web::resource("/users/{id}/ban").route(web::patch().to(ban_account)))
            .service(web::resource("/users/{id}/unban").route(web::patch().to(unban_account)))
            .service(web::resource("/salons").route(web::post().to(create_salon))),
    );
}

async fn create_account(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    body: web::Json<CreateUserBody>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let username = body.username.trim();
    if username.is_empty() || body.password.trim().is_empty() {
        return Err(ServiceError::BadRequest(
            "Username and password are required.".to_string(),
        ));
    }

    let role = body.role.as_deref().unwrap_or(ROLE_CUSTOMER);
    if role != ROLE_CUSTOMER && role != ROLE_VENDOR {
        return Err(ServiceError::BadRequest(
            "Role must be customer or vendor.".to_string(),
        ));
    }

    let display_name = body
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(username);

    let user = create_user(
        &state.db,
        NewUser {
            username,
            display_name,
            phone: body.phone.as_deref(),
            role,
            password: &body.password,
        },
    )
    .await?;

    log::info!("{} created {} account {}", auth.display_name, user.role, user.username);

    Ok(HttpResponse::Created().json(account_json(&user)))
}

async fn ban_account(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    if user_id == auth.id {
        return Err(ServiceError::BadRequest("You cannot ban your own account.".to_string()));
    }
    set_account_active(&state, &auth, &user_id, false).await
}

async fn unban_account(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    set_account_active(&state, &auth, &path.into_inner(), true).await
}

async fn set_account_active(
    state: &AppState,
    auth: &AuthUser,
    user_id: &str,
    active: bool,
) -> Result<HttpResponse> {
    let user = set_user_active(&state.db, user_id, active)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;
    let action = if active { "unbanned" } else { "banned" };
    log::info!("{} {action} account {}", auth.display_name, user.username);
    Ok(HttpResponse::Ok().json(account_json(&user)))
}

fn account_json(user: &UserRow) -> serde_json::Value {
    json!({
        "id": user.id,
        "username": user.username,
        "displayName": user.display_name,
        "role": user.role,
        "active": user.active != 0,
    })
}

async fn create_salon(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    body: web::Json<CreateSalonBody>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ServiceError::BadRequest("Salon name is required.".to_string()));
    }

    let owner_role = sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = ?")
        .bind(&body.owner_id)
        .fetch_optional(&state.db)
        .await?;
    if owner_role.as_deref() != Some(ROLE_VENDOR) {
        return Err(ServiceError::BadRequest(
            "Salon owner must be a vendor account.".to_string(),
        ));
    }

    let salon = salons::create(
        &state.db,
        name,
        &body.owner_id,
        body.city.as_deref(),
        body.contact_no.as_deref(),
    )
    .await?;

    log::info!("{} created salon {} ({})", auth.display_name, salon.name, salon.id);
    Ok(HttpResponse::Created().json(salon))
}
