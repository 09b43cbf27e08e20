use actix_web::{web, HttpResponse};
use serde_json::json;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "Salon queue API server", "health": "/health" }))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}
