use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;

use crate::{
    appointments,
    auth::{basic_validator, AuthUser},
    error::Result,
    queue::{BookingRequest, Requester},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
struct CancelAppointmentBody {
    reason: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/appointments")
            .wrap(HttpAuthentication::basic(basic_validator))
            .service(web::resource("").route(web::post().to(create_appointment)))
            .service(web::resource("/mine").route(web::get().to(list_mine)))
            .service(web::resource("/{id}/cancel").route(web::patch().to(cancel_appointment))),
    );
}

async fn create_appointment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    body: web::Json<BookingRequest>,
) -> Result<HttpResponse> {
    let booked = state
        .queue_service()
        .book_appointment(&Requester::from(&*auth), &body)
        .await?;
    Ok(HttpResponse::Created().json(booked))
}

async fn list_mine(state: web::Data<AppState>, auth: web::ReqData<AuthUser>) -> Result<HttpResponse> {
    let items = appointments::list_for_user(&state.db, &auth.id).await?;
    Ok(HttpResponse::Ok().json(items))
}

async fn cancel_appointment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    body: Option<web::Json<CancelAppointmentBody>>,
) -> Result<HttpResponse> {
    let appointment_id = path.into_inner();
    let body = body.map(web::Json::into_inner).unwrap_or_default();
    let appointment = state
        .queue_service()
        .cancel_appointment(&appointment_id, &Requester::from(&*auth), body.reason.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(appointment))
}
